//! Environment overrides live in their own test binary so no other test
//! observes the modified process environment.

use std::io::Write;

use linkwatch::config::{Config, IDENTITY_ENV, PROBE_URL_ENV};

#[test]
fn environment_overrides_file_values() {
    let mut file = tempfile::NamedTempFile::new().expect("create temp config");
    file.write_all(
        br#"
identity = "from-file"

[probe]
url = "wss://file.example.com"
"#,
    )
    .expect("write temp config");

    std::env::set_var(PROBE_URL_ENV, "ws://env.example.com:9000/socket");
    std::env::set_var(IDENTITY_ENV, "from-env");
    let result = Config::load(file.path());
    std::env::remove_var(PROBE_URL_ENV);
    std::env::remove_var(IDENTITY_ENV);

    let config = result.expect("valid config");
    assert_eq!(config.probe.url, "ws://env.example.com:9000/socket");
    assert_eq!(config.identity.as_deref(), Some("from-env"));
}
