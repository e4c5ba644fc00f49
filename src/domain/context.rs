//! Operation Context
//!
//! Request metadata carried into dispatch. Every context has a correlation
//! ID; the transport either continues the caller's or starts a new one.

use std::net::IpAddr;

use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationContext {
    pub correlation_id: Uuid,
    pub client_ip: Option<IpAddr>,
}

impl OperationContext {
    /// Fresh context with a newly generated correlation ID
    pub fn new() -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            client_ip: None,
        }
    }

    /// Continue a caller-supplied correlation ID. Anything that is not a
    /// UUID is ignored and a new ID is started.
    pub fn continuing(raw: Option<&str>) -> Self {
        match raw.and_then(|s| Uuid::parse_str(s.trim()).ok()) {
            Some(id) => Self::new().with_correlation_id(id),
            None => Self::new(),
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = correlation_id;
        self
    }

    pub fn with_client_ip(mut self, ip: IpAddr) -> Self {
        self.client_ip = Some(ip);
        self
    }
}

impl Default for OperationContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_contexts_are_distinct() {
        assert_ne!(
            OperationContext::new().correlation_id,
            OperationContext::new().correlation_id
        );
    }

    #[test]
    fn test_continuing_keeps_valid_id() {
        let id = Uuid::new_v4();
        let context = OperationContext::continuing(Some(&format!(" {} ", id)));

        assert_eq!(context.correlation_id, id);
        assert!(context.client_ip.is_none());
    }

    #[test]
    fn test_continuing_replaces_garbage() {
        let context = OperationContext::continuing(Some("not-a-uuid"));
        assert!(!context.correlation_id.is_nil());

        let ip: IpAddr = "10.0.0.7".parse().unwrap();
        let context = OperationContext::continuing(None).with_client_ip(ip);
        assert_eq!(context.client_ip, Some(ip));
    }
}
