//! Room and key bootstrap tests.
//!
//! Resolution of the room id (path, storage, generated) and of the room key
//! (fragment or generated) against in-memory location and storage.

use veilroom_core::{
    RoomId, SyncError,
    keys::{load_key, load_or_create_key},
    location::{Location, MemoryLocation, MemoryStorage, Storage},
    room::{ROOM_STORAGE_KEY, resolve_room},
};
use veilroom_crypto::{KEY_SIZE, RoomKey};
use veilroom_harness::SimEnv;

#[test]
fn path_segment_wins_and_is_stored() {
    let env = SimEnv::with_seed(1);
    let mut location = MemoryLocation::new("/room/0123456789ABCDEF/", None);
    let mut storage = MemoryStorage::default();
    storage.set(ROOM_STORAGE_KEY, "fedcba9876543210").unwrap();

    let room = resolve_room(&mut location, &mut storage, &env).unwrap();

    assert_eq!(room.as_str(), "0123456789abcdef");
    assert_eq!(storage.get(ROOM_STORAGE_KEY).as_deref(), Some("0123456789abcdef"));
}

#[test]
fn stored_room_rewrites_path() {
    let env = SimEnv::with_seed(2);
    let mut location = MemoryLocation::new("/", None);
    let mut storage = MemoryStorage::default();
    storage.set(ROOM_STORAGE_KEY, "fedcba9876543210").unwrap();

    let room = resolve_room(&mut location, &mut storage, &env).unwrap();

    assert_eq!(room.as_str(), "fedcba9876543210");
    assert_eq!(location.path(), "/room/fedcba9876543210");
}

#[test]
fn malformed_path_segment_falls_back_to_storage() {
    let env = SimEnv::with_seed(3);
    let mut location = MemoryLocation::new("/room/not-a-room", None);
    let mut storage = MemoryStorage::default();
    storage.set(ROOM_STORAGE_KEY, "fedcba9876543210").unwrap();

    let room = resolve_room(&mut location, &mut storage, &env).unwrap();
    assert_eq!(room.as_str(), "fedcba9876543210");
}

#[test]
fn generated_room_is_persisted() {
    let env = SimEnv::with_seed(4);
    let mut location = MemoryLocation::new("/", None);
    let mut storage = MemoryStorage::default();

    let room = resolve_room(&mut location, &mut storage, &env).unwrap();

    assert!(RoomId::parse(room.as_str()).is_some());
    assert_eq!(storage.get(ROOM_STORAGE_KEY), Some(room.to_string()));
    assert_eq!(location.path(), room.path());
}

#[test]
fn same_seed_generates_same_room() {
    let a = RoomId::generate(&SimEnv::with_seed(9));
    let b = RoomId::generate(&SimEnv::with_seed(9));
    assert_eq!(a, b);
}

#[test]
fn fragment_key_is_imported_without_rewrite() {
    let env = SimEnv::with_seed(5);
    let hex = "00".repeat(KEY_SIZE);
    let mut location = MemoryLocation::new("/", Some(&hex));

    let key = load_or_create_key(&mut location, &env);

    assert_eq!(key, RoomKey::from_bytes([0u8; KEY_SIZE]));
    assert_eq!(location.fragment(), Some(hex));
}

#[test]
fn missing_fragment_generates_and_publishes_key() {
    let env = SimEnv::with_seed(6);
    let mut location = MemoryLocation::new("/room/0123456789abcdef", None);

    let key = load_or_create_key(&mut location, &env);

    let fragment = location.fragment().unwrap();
    assert_eq!(fragment.len(), KEY_SIZE * 2);
    assert_eq!(load_key(&location).unwrap(), key);
    assert_eq!(location.path(), "/room/0123456789abcdef");
}

#[test]
fn malformed_fragment_is_replaced() {
    let env = SimEnv::with_seed(7);
    let mut location = MemoryLocation::new("/", Some("not-a-key"));
    assert_eq!(load_key(&location).unwrap_err(), SyncError::MissingKey);

    let key = load_or_create_key(&mut location, &env);
    assert_eq!(load_key(&location).unwrap(), key);
}
