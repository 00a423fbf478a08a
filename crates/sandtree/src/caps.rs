use std::sync::OnceLock;

/// Platform feature availability, resolved once per process. Tests consult
/// these flags instead of sprinkling target checks through their bodies.
#[derive(Clone, Copy, Debug)]
pub struct Capabilities {
    pub symlinks: bool,
    pub hard_links: bool,
    pub fifos: bool,
    pub unix_domain_sockets: bool,
}

impl Capabilities {
    fn detect() -> Self {
        let unix = cfg!(unix);
        Self {
            symlinks: unix,
            hard_links: unix,
            fifos: unix,
            // Socket files can't be created through the usual path-based API
            // on macOS and FreeBSD.
            unix_domain_sockets: unix && !cfg!(any(target_os = "macos", target_os = "freebsd")),
        }
    }
}

pub fn caps() -> Capabilities {
    static CAPS: OnceLock<Capabilities> = OnceLock::new();
    *CAPS.get_or_init(Capabilities::detect)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detection_is_stable() {
        let first = caps();
        let second = caps();
        assert_eq!(first.symlinks, second.symlinks);
        assert_eq!(first.unix_domain_sockets, second.unix_domain_sockets);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn linux_has_everything() {
        let caps = caps();
        assert!(caps.symlinks);
        assert!(caps.hard_links);
        assert!(caps.fifos);
        assert!(caps.unix_domain_sockets);
    }
}
