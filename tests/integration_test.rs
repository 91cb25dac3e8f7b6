use cachevault::{AssetStore, BlockStore, Bundle, Package};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use tempfile::NamedTempFile;

#[test]
fn block_store_roundtrips_through_real_files() {
    let main_temp = NamedTempFile::new().unwrap();
    let index_temp = NamedTempFile::new().unwrap();

    let test_data = b"Hello, block store!".to_vec();

    {
        let main = File::options().read(true).write(true).open(main_temp.path()).unwrap();
        let index = File::options().read(true).write(true).open(index_temp.path()).unwrap();
        let store = BlockStore::new(0, main, index);
        assert!(store.put(4, &test_data));
        let (main, index) = store.close();
        drop(main);
        drop(index);
    }

    {
        let main = File::options().read(true).write(true).open(main_temp.path()).unwrap();
        let index = File::options().read(true).write(true).open(index_temp.path()).unwrap();
        let store = BlockStore::new(0, main, index);
        assert_eq!(store.get(4), Some(test_data));
    }
}

#[test]
fn asset_store_pack_and_list_via_real_files() {
    let main_temp = NamedTempFile::new().unwrap();
    let index_temp = NamedTempFile::new().unwrap();

    {
        let main = File::options().read(true).write(true).open(main_temp.path()).unwrap();
        let index = File::options().read(true).write(true).open(index_temp.path()).unwrap();
        let assets = AssetStore::new(BlockStore::new(0, main, index));

        let mut bundle = Bundle::new(1, false);
        bundle.put(0, "test.txt", b"Hello, cachevault!").unwrap();
        assets.write_bundle(0, &bundle).unwrap();
    }

    {
        let main = File::options().read(true).write(true).open(main_temp.path()).unwrap();
        let index = File::options().read(true).write(true).open(index_temp.path()).unwrap();
        let assets = AssetStore::new(BlockStore::new(0, main, index));
        let data = assets.read_entry(0, "TEST.TXT").unwrap();
        assert_eq!(data, b"Hello, cachevault!".to_vec());
    }
}

#[test]
fn corrupted_chain_is_not_silently_returned() {
    use cachevault::BLOCK_SIZE;

    let main_temp = NamedTempFile::new().unwrap();
    let index_temp = NamedTempFile::new().unwrap();

    {
        let main = File::options().read(true).write(true).open(main_temp.path()).unwrap();
        let index = File::options().read(true).write(true).open(index_temp.path()).unwrap();
        let store = BlockStore::new(0, main, index);
        assert!(store.put(1, &vec![7u8; 1000]));
    }

    {
        let mut main = File::options().read(true).write(true).open(main_temp.path()).unwrap();
        main.seek(SeekFrom::Start(BLOCK_SIZE as u64)).unwrap();
        main.write_all(&[0xFF]).unwrap();
    }

    {
        let main = File::options().read(true).write(true).open(main_temp.path()).unwrap();
        let index = File::options().read(true).write(true).open(index_temp.path()).unwrap();
        let store = BlockStore::new(0, main, index);
        assert_eq!(store.get(1), None);
    }
}

#[test]
fn package_wholly_compressed_round_trips_multiple_entries() {
    let mut bundle = Bundle::new(3, true);
    bundle.put(0, "ALPHA", b"first entry body").unwrap();
    bundle.put(1, "BETA", b"second entry body, a bit longer").unwrap();
    bundle.put(2, "GAMMA", b"g").unwrap();

    let blob = bundle.pack().unwrap();
    let mut pkg = Package::parse(&blob).unwrap();
    pkg.unpack().unwrap();

    assert_eq!(pkg.get("alpha"), Some(b"first entry body".to_vec()));
    assert_eq!(pkg.get("BETA"), Some(b"second entry body, a bit longer".to_vec()));
    assert_eq!(pkg.get("Gamma"), Some(b"g".to_vec()));
}

#[test]
fn read_to_end_still_sees_index_file_length() {
    let main_temp = NamedTempFile::new().unwrap();
    let index_temp = NamedTempFile::new().unwrap();
    let main = File::options().read(true).write(true).open(main_temp.path()).unwrap();
    let index = File::options().read(true).write(true).open(index_temp.path()).unwrap();
    let store = BlockStore::new(0, main, index);
    assert!(store.put(0, b"a"));
    let (_, mut index_file) = store.close();
    index_file.seek(SeekFrom::Start(0)).unwrap();
    let mut bytes = Vec::new();
    index_file.read_to_end(&mut bytes).unwrap();
    assert_eq!(bytes.len(), 6);
}
