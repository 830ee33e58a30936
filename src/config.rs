//! Configuration. No environment variables, no config files, no persisted
//! client state: the host application supplies everything the client needs
//! at construction time, through this struct.

/// Default maximum request size: requests larger than this, once a single
/// `Bytes` argument is accounted for, get split by [`crate::chunking`].
pub const DEFAULT_MAX_REQUEST_SIZE: usize = 64 * 1024;

/// Default maximum proxies per message: bounds how many candidate handles
/// a vector-of-handles out-parameter call pre-creates. Chosen generously
/// above any certificate chain depth seen in practice (typical chains are
/// under 10 certs) while keeping a single request's worst-case new-id list
/// small.
pub const DEFAULT_MAX_PROXIES_PER_MSG: usize = 64;

/// Client-wide tunables. Built once per transport session and shared by
/// every handle created against it.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    max_request_size: usize,
    max_proxies_per_msg: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            max_request_size: DEFAULT_MAX_REQUEST_SIZE,
            max_proxies_per_msg: DEFAULT_MAX_PROXIES_PER_MSG,
        }
    }
}

impl ClientConfig {
    pub fn new() -> ClientConfig {
        ClientConfig::default()
    }

    /// Overrides `MAX_REQUEST_SIZE`. Must agree with whatever the server was
    /// built with; the core does not negotiate this over the wire.
    pub fn with_max_request_size(mut self, max_request_size: usize) -> ClientConfig {
        assert!(max_request_size > 0, "max_request_size must be positive");
        self.max_request_size = max_request_size;
        self
    }

    pub fn with_max_proxies_per_msg(mut self, max_proxies_per_msg: usize) -> ClientConfig {
        assert!(max_proxies_per_msg > 0, "max_proxies_per_msg must be positive");
        self.max_proxies_per_msg = max_proxies_per_msg;
        self
    }

    pub fn max_request_size(&self) -> usize {
        self.max_request_size
    }

    pub fn max_proxies_per_msg(&self) -> usize {
        self.max_proxies_per_msg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = ClientConfig::new();
        assert_eq!(cfg.max_request_size(), DEFAULT_MAX_REQUEST_SIZE);
        assert_eq!(cfg.max_proxies_per_msg(), DEFAULT_MAX_PROXIES_PER_MSG);
    }

    #[test]
    fn builder_overrides_apply() {
        let cfg = ClientConfig::new()
            .with_max_request_size(4096)
            .with_max_proxies_per_msg(8);
        assert_eq!(cfg.max_request_size(), 4096);
        assert_eq!(cfg.max_proxies_per_msg(), 8);
    }
}
