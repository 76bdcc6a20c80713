use super::*;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn empty_environment_gives_defaults() {
    let config = Config::from_lookup(|_| None);
    assert_eq!(config, Config::default());
    assert_eq!(config.expiry_check, Duration::from_secs(60));
    assert_eq!(config.storage_dir, PathBuf::from(".stockkid"));
    assert!(config.oauth_clients.is_empty());
}

#[test]
fn overrides_are_applied() {
    let config = Config::from_lookup(lookup_from(&[
        ("STOCKKID_STORAGE_DIR", "/tmp/sk"),
        ("STOCKKID_API_BASE_URL", "https://api.example.com/"),
        ("STOCKKID_EXPIRY_CHECK_SECS", "5"),
        ("STOCKKID_HTTP_TIMEOUT_SECS", " 30 "),
    ]));
    assert_eq!(config.storage_dir, PathBuf::from("/tmp/sk"));
    assert_eq!(config.api_base_url, "https://api.example.com");
    assert_eq!(config.expiry_check, Duration::from_secs(5));
    assert_eq!(config.request_timeout, Duration::from_secs(30));
}

#[test]
fn invalid_durations_fall_back() {
    let config = Config::from_lookup(lookup_from(&[
        ("STOCKKID_EXPIRY_CHECK_SECS", "0"),
        ("STOCKKID_OAUTH_TIMEOUT_SECS", "soon"),
    ]));
    assert_eq!(config.expiry_check, Duration::from_secs(DEFAULT_EXPIRY_CHECK_SECS));
    assert_eq!(config.oauth_timeout, Duration::from_secs(DEFAULT_OAUTH_TIMEOUT_SECS));
}

#[test]
fn provider_needs_id_and_redirect() {
    let config = Config::from_lookup(lookup_from(&[
        ("STOCKKID_KAKAO_CLIENT_ID", "kakao-id"),
        ("STOCKKID_KAKAO_REDIRECT_URI", "http://localhost/kakao"),
        ("STOCKKID_GOOGLE_CLIENT_ID", "google-id"),
    ]));
    let kakao = config.oauth_client(OAuthProvider::Kakao).unwrap();
    assert_eq!(kakao.client_id, "kakao-id");
    assert!(config.oauth_client(OAuthProvider::Google).is_none());
    assert!(config.oauth_client(OAuthProvider::Naver).is_none());
}
