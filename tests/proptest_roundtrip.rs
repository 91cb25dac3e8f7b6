use cachevault::{name_hash, BlockStore, Bundle, Package};
use proptest::prelude::*;
use std::io::Cursor;

fn new_store() -> BlockStore<Cursor<Vec<u8>>> {
    BlockStore::new(0, Cursor::new(Vec::new()), Cursor::new(Vec::new()))
}

proptest! {
    #[test]
    fn block_store_roundtrip(id in 0u16..2000, bytes in proptest::collection::vec(any::<u8>(), 0..4096)) {
        let store = new_store();
        prop_assert!(store.put(id, &bytes));
        prop_assert_eq!(store.get(id), Some(bytes));
    }

    #[test]
    fn name_hash_is_deterministic_and_case_insensitive(name in "[A-Za-z0-9_.]{0,32}") {
        let upper = name.to_ascii_uppercase();
        prop_assert_eq!(name_hash(&name), name_hash(&upper));
        prop_assert_eq!(name_hash(&name), name_hash(&name));
    }

    #[test]
    fn package_per_entry_roundtrip(name in "[A-Z]{1,16}", body in proptest::collection::vec(any::<u8>(), 0..2048)) {
        let mut bundle = Bundle::new(1, false);
        bundle.put(0, &name, &body).unwrap();
        let blob = bundle.pack().unwrap();
        let pkg = Package::parse(&blob).unwrap();
        prop_assert_eq!(pkg.get(&name), Some(body));
    }

    #[test]
    fn package_wholly_compressed_roundtrip(name in "[A-Z]{1,16}", body in proptest::collection::vec(any::<u8>(), 0..2048)) {
        let mut bundle = Bundle::new(1, true);
        bundle.put(0, &name, &body).unwrap();
        let blob = bundle.pack().unwrap();
        let pkg = Package::parse(&blob).unwrap();
        prop_assert_eq!(pkg.get(&name), Some(body));
    }
}
