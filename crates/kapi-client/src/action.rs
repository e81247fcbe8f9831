use std::time::Duration;

use bytes::Bytes;
use http::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use http::Method;
use kapi_types::PrevExist;
use url::{form_urlencoded, Url};

/// Path from an endpoint's root to the keys API.
pub const DEFAULT_PREFIX: &str = "/v2/keys";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Everything a transport needs to put one request on the wire.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl RequestDescriptor {
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    /// Decoded form fields of the body, empty when there is no body.
    pub fn form_pairs(&self) -> Vec<(String, String)> {
        match &self.body {
            Some(body) => form_urlencoded::parse(body).into_owned().collect(),
            None => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetAction {
    pub prefix: String,
    pub key: String,
    pub recursive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitAction {
    pub prefix: String,
    pub key: String,
    pub wait_index: u64,
    pub recursive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetAction {
    pub prefix: String,
    pub key: String,
    pub value: String,
    pub prev_value: String,
    pub prev_index: u64,
    pub prev_exist: PrevExist,
    pub ttl: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteAction {
    pub prefix: String,
    pub key: String,
    pub prev_value: String,
    pub prev_index: u64,
    pub recursive: bool,
}

/// The closed set of requests the keys API can issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Get(GetAction),
    Wait(WaitAction),
    Set(SetAction),
    Delete(DeleteAction),
}

impl Action {
    /// Build the request against `endpoint`, the base URL of one server.
    pub fn request(&self, endpoint: &Url) -> RequestDescriptor {
        match self {
            Action::Get(a) => a.request(endpoint),
            Action::Wait(a) => a.request(endpoint),
            Action::Set(a) => a.request(endpoint),
            Action::Delete(a) => a.request(endpoint),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Action::Get(a) => &a.key,
            Action::Wait(a) => &a.key,
            Action::Set(a) => &a.key,
            Action::Delete(a) => &a.key,
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Action::Get(_) | Action::Wait(_) => Method::GET,
            Action::Set(_) => Method::PUT,
            Action::Delete(_) => Method::DELETE,
        }
    }
}

impl GetAction {
    pub fn request(&self, endpoint: &Url) -> RequestDescriptor {
        let url = keys_url(
            endpoint,
            &self.prefix,
            &self.key,
            vec![("recursive", self.recursive.to_string())],
        );
        RequestDescriptor { method: Method::GET, url, headers: HeaderMap::new(), body: None }
    }
}

impl WaitAction {
    pub fn request(&self, endpoint: &Url) -> RequestDescriptor {
        let url = keys_url(
            endpoint,
            &self.prefix,
            &self.key,
            vec![
                ("wait", "true".to_string()),
                ("waitIndex", self.wait_index.to_string()),
                ("recursive", self.recursive.to_string()),
            ],
        );
        RequestDescriptor { method: Method::GET, url, headers: HeaderMap::new(), body: None }
    }
}

impl SetAction {
    pub fn request(&self, endpoint: &Url) -> RequestDescriptor {
        let mut params = precondition_params(&self.prev_value, self.prev_index);
        if let Some(exist) = self.prev_exist.as_query_value() {
            params.push(("prevExist", exist.to_string()));
        }
        let url = keys_url(endpoint, &self.prefix, &self.key, params);

        let mut form = vec![("value", self.value.clone())];
        // Sub-second TTLs round down to 0 but are still sent.
        if !self.ttl.is_zero() {
            form.push(("ttl", self.ttl.as_secs().to_string()));
        }

        RequestDescriptor {
            method: Method::PUT,
            url,
            headers: form_headers(),
            body: Some(Bytes::from(encode_pairs(form))),
        }
    }
}

impl DeleteAction {
    pub fn request(&self, endpoint: &Url) -> RequestDescriptor {
        let mut params = precondition_params(&self.prev_value, self.prev_index);
        if self.recursive {
            params.push(("recursive", "true".to_string()));
        }
        let url = keys_url(endpoint, &self.prefix, &self.key, params);

        // No body, but servers expect the form content type on deletes.
        RequestDescriptor { method: Method::DELETE, url, headers: form_headers(), body: None }
    }
}

impl From<GetAction> for Action {
    fn from(a: GetAction) -> Self {
        Action::Get(a)
    }
}

impl From<WaitAction> for Action {
    fn from(a: WaitAction) -> Self {
        Action::Wait(a)
    }
}

impl From<SetAction> for Action {
    fn from(a: SetAction) -> Self {
        Action::Set(a)
    }
}

impl From<DeleteAction> for Action {
    fn from(a: DeleteAction) -> Self {
        Action::Delete(a)
    }
}

/// Unset preconditions are left out entirely so the server does not compare
/// against an empty value or index 0.
fn precondition_params(prev_value: &str, prev_index: u64) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if !prev_value.is_empty() {
        params.push(("prevValue", prev_value.to_string()));
    }
    if prev_index != 0 {
        params.push(("prevIndex", prev_index.to_string()));
    }
    params
}

fn form_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
    headers
}

/// Form-encode `pairs` sorted by name so the output is deterministic.
fn encode_pairs(mut pairs: Vec<(&'static str, String)>) -> String {
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

/// `endpoint` with its path replaced by `endpoint.path/prefix/key` (cleaned)
/// and its query replaced by `params`.
pub fn keys_url(
    endpoint: &Url,
    prefix: &str,
    key: &str,
    params: Vec<(&'static str, String)>,
) -> Url {
    let mut url = endpoint.clone();
    let joined = clean_path(&format!("{}/{}/{}", endpoint.path(), prefix, key));
    url.set_path(&joined);
    if params.is_empty() {
        url.set_query(None);
    } else {
        url.set_query(Some(&encode_pairs(params)));
    }
    url.set_fragment(None);
    url
}

/// Lexically clean a slash separated path: collapse repeated separators,
/// resolve `.` and `..`, drop any trailing separator. Always absolute.
pub fn clean_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    format!("/{}", parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> Url {
        Url::parse("http://127.0.0.1:2379").unwrap()
    }

    fn set_action(key: &str) -> SetAction {
        SetAction {
            prefix: DEFAULT_PREFIX.into(),
            key: key.into(),
            value: "bar".into(),
            prev_value: String::new(),
            prev_index: 0,
            prev_exist: PrevExist::Ignore,
            ttl: Duration::ZERO,
        }
    }

    fn delete_action(key: &str) -> DeleteAction {
        DeleteAction {
            prefix: DEFAULT_PREFIX.into(),
            key: key.into(),
            prev_value: String::new(),
            prev_index: 0,
            recursive: false,
        }
    }

    #[test]
    fn clean_path_normalizes() {
        assert_eq!(clean_path(""), "/");
        assert_eq!(clean_path("//v2//keys///foo/"), "/v2/keys/foo");
        assert_eq!(clean_path("/v2/keys/./a/../b"), "/v2/keys/b");
        assert_eq!(clean_path("/../.."), "/");
    }

    #[test]
    fn keys_url_joins_endpoint_path_prefix_and_key() {
        let cases = [
            ("http://a:2379", "/v2/keys", "/foo/bar", "/v2/keys/foo/bar"),
            ("http://a:2379/", "/v2/keys/", "foo", "/v2/keys/foo"),
            ("http://a:2379/proxy", "/v2/keys", "//foo//bar/", "/proxy/v2/keys/foo/bar"),
            ("http://a:2379", "", "/foo", "/foo"),
            ("http://a:2379", "/v2/keys", "", "/v2/keys"),
        ];
        for (ep, prefix, key, want) in cases {
            let url = keys_url(&Url::parse(ep).unwrap(), prefix, key, Vec::new());
            assert_eq!(url.path(), want, "endpoint={ep} prefix={prefix} key={key}");
            assert_eq!(url.query(), None);
        }
    }

    #[test]
    fn get_action_recursive_flag() {
        let mut get = GetAction { prefix: DEFAULT_PREFIX.into(), key: "/foo".into(), recursive: false };
        let req = get.request(&endpoint());
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.url.as_str(), "http://127.0.0.1:2379/v2/keys/foo?recursive=false");
        assert!(req.body.is_none());

        get.recursive = true;
        let req = get.request(&endpoint());
        assert_eq!(req.url.as_str(), "http://127.0.0.1:2379/v2/keys/foo?recursive=true");
    }

    #[test]
    fn wait_action_params() {
        let wait = WaitAction {
            prefix: DEFAULT_PREFIX.into(),
            key: "/foo".into(),
            wait_index: 12,
            recursive: true,
        };
        let req = wait.request(&endpoint());
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.query_param("wait").as_deref(), Some("true"));
        assert_eq!(req.query_param("waitIndex").as_deref(), Some("12"));
        assert_eq!(req.query_param("recursive").as_deref(), Some("true"));
        assert!(req.body.is_none());
    }

    #[test]
    fn set_action_omits_unset_preconditions() {
        let req = set_action("/foo").request(&endpoint());
        assert_eq!(req.method, Method::PUT);
        assert_eq!(req.url.query(), None);
        assert_eq!(req.headers.get(CONTENT_TYPE).unwrap(), FORM_CONTENT_TYPE);
        assert_eq!(req.form_pairs(), vec![("value".to_string(), "bar".to_string())]);
    }

    #[test]
    fn set_action_all_preconditions() {
        let mut set = set_action("/foo");
        set.prev_value = "old value".into();
        set.prev_index = 42;
        set.prev_exist = PrevExist::MustExist;
        let req = set.request(&endpoint());
        assert_eq!(
            req.url.query(),
            Some("prevExist=true&prevIndex=42&prevValue=old+value")
        );

        set.prev_exist = PrevExist::MustNotExist;
        let req = set.request(&endpoint());
        assert_eq!(req.query_param("prevExist").as_deref(), Some("false"));
    }

    #[test]
    fn set_action_ttl_seconds_round_down() {
        let mut set = set_action("/foo");
        set.ttl = Duration::from_secs(5);
        let req = set.request(&endpoint());
        assert_eq!(req.body.as_deref(), Some(&b"ttl=5&value=bar"[..]));

        set.ttl = Duration::from_millis(2900);
        let req = set.request(&endpoint());
        assert!(req.form_pairs().contains(&("ttl".to_string(), "2".to_string())));

        set.ttl = Duration::ZERO;
        let req = set.request(&endpoint());
        assert!(req.form_pairs().iter().all(|(k, _)| k != "ttl"));
    }

    #[test]
    fn set_action_encodes_special_values() {
        let mut set = set_action("/foo");
        set.value = "a&b=c d".into();
        let req = set.request(&endpoint());
        assert_eq!(req.form_pairs(), vec![("value".to_string(), "a&b=c d".to_string())]);
    }

    #[test]
    fn delete_action_recursive_only_when_true() {
        let mut del = delete_action("/foo");
        let req = del.request(&endpoint());
        assert_eq!(req.method, Method::DELETE);
        assert_eq!(req.url.query(), None);
        assert!(req.body.is_none());
        assert_eq!(req.headers.get(CONTENT_TYPE).unwrap(), FORM_CONTENT_TYPE);

        del.recursive = true;
        let req = del.request(&endpoint());
        assert_eq!(req.url.query(), Some("recursive=true"));
    }

    #[test]
    fn delete_action_preconditions() {
        let mut del = delete_action("/foo");
        del.prev_value = "x".into();
        del.prev_index = 3;
        let req = del.request(&endpoint());
        assert_eq!(req.url.query(), Some("prevIndex=3&prevValue=x"));
        assert_eq!(req.query_param("recursive"), None);
    }

    #[test]
    fn action_enum_dispatches_to_variant() {
        let action: Action = delete_action("/x").into();
        assert_eq!(action.method(), Method::DELETE);
        assert_eq!(action.key(), "/x");
        assert_eq!(action.request(&endpoint()).method, Method::DELETE);
    }
}
