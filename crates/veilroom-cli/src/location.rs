//! Room link handling.
//!
//! A room link is a URL of the form `https://host/room/<id>#<key-hex>`. The
//! terminal client treats it the way a browser treats its address bar: the
//! key is read from and written to the fragment, the room id from and to the
//! path. The fragment never leaves this process.

use veilroom_client::transport::Url;
use veilroom_core::location::Location;

/// [`Location`] backed by a parsed URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlLocation {
    url: Url,
}

impl UrlLocation {
    /// Wrap `url`.
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    /// The current link, including the key fragment.
    ///
    /// Treat the result as a secret: anyone holding it can read the room.
    pub fn share_link(&self) -> &Url {
        &self.url
    }

    /// Scheme, host and port of the link, with an empty path.
    pub fn origin(&self) -> Url {
        let mut origin = self.url.clone();
        origin.set_path("/");
        origin.set_query(None);
        origin.set_fragment(None);
        origin
    }
}

impl Location for UrlLocation {
    fn fragment(&self) -> Option<String> {
        self.url.fragment().filter(|f| !f.is_empty()).map(str::to_owned)
    }

    fn set_fragment(&mut self, fragment: &str) {
        self.url.set_fragment(Some(fragment));
    }

    fn path(&self) -> String {
        self.url.path().to_owned()
    }

    fn set_path(&mut self, path: &str) {
        self.url.set_path(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_room_path_and_key_fragment() {
        let url = Url::parse("https://chat.example/room/0123456789abcdef#00ff").unwrap();
        let location = UrlLocation::new(url);

        assert_eq!(location.path(), "/room/0123456789abcdef");
        assert_eq!(location.fragment().as_deref(), Some("00ff"));
    }

    #[test]
    fn empty_fragment_is_absent() {
        let location = UrlLocation::new(Url::parse("https://chat.example/#").unwrap());
        assert_eq!(location.fragment(), None);
    }

    #[test]
    fn writes_update_share_link() {
        let mut location = UrlLocation::new(Url::parse("http://127.0.0.1:8000/").unwrap());
        location.set_path("/room/fedcba9876543210");
        location.set_fragment("abcd");

        assert_eq!(
            location.share_link().as_str(),
            "http://127.0.0.1:8000/room/fedcba9876543210#abcd"
        );
        assert_eq!(location.origin().as_str(), "http://127.0.0.1:8000/");
    }

    mod props {
        use proptest::prelude::*;
        use veilroom_core::{
            keys::load_key,
            location::MemoryStorage,
            room::{RoomId, resolve_room},
        };

        use super::*;
        use crate::SystemEnv;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn shared_link_reopens_same_room_and_key(
                room in "[0-9a-f]{16}",
                key in "[0-9a-f]{64}",
                port in 1024u16..65535,
            ) {
                let mut location =
                    UrlLocation::new(Url::parse(&format!("http://127.0.0.1:{port}/")).unwrap());
                location.set_path(&RoomId::parse(&room).unwrap().path());
                location.set_fragment(&key);

                let link = location.share_link().as_str().to_owned();
                let mut reopened = UrlLocation::new(Url::parse(&link).unwrap());
                let mut storage = MemoryStorage::default();

                let resolved = resolve_room(&mut reopened, &mut storage, &SystemEnv::new()).unwrap();
                prop_assert_eq!(resolved.as_str(), room.as_str());
                let loaded_hex = load_key(&reopened).unwrap().to_hex();
                prop_assert_eq!(loaded_hex.as_str(), key.as_str());
                prop_assert_eq!(reopened.share_link().as_str(), link.as_str());
            }
        }
    }
}
