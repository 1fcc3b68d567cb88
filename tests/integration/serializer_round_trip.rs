use super::seeded_tree;
use graphmap::store::{save_tree, save_tree_overwrite};
use graphmap::{Child, ImageTree, MemoryPersistence, Persistence, Pixel, Serializer, StorageError, TreeError};
use tempfile::TempDir;

fn path(dir: &TempDir, file: &str) -> String {
    dir.path().join(file).display().to_string()
}

#[test]
fn round_trip_every_format() {
    let dir = TempDir::new().unwrap();
    for extension in ["tsv", "tsv.gz", "itpb", "itpb.gz"] {
        let filename = path(&dir, &format!("tree.{}", extension));
        let tree = seeded_tree(7, "root", &filename, 4);
        let writer = Serializer::default();
        assert_eq!(save_tree(&writer, &tree).unwrap(), vec![filename.clone()]);

        let reader = Serializer::default();
        let loaded = reader.load_node(&format!("root@{}", filename)).unwrap();
        assert!(loaded.equals(&tree, &reader).unwrap(), "mismatch for {}", extension);
        assert_eq!(loaded.count_nodes(&reader).unwrap(), 1 + 4 + 16 + 64);
    }
}

#[test]
fn save_refuses_existing_file() {
    let dir = TempDir::new().unwrap();
    let filename = path(&dir, "once.tsv");
    let tree = seeded_tree(1, "root", &filename, 2);
    let serializer = Serializer::default();
    save_tree(&serializer, &tree).unwrap();

    let err = save_tree(&serializer, &tree).unwrap_err();
    assert!(matches!(err, TreeError::Storage(StorageError::AlreadyExists(_))));
    save_tree_overwrite(&serializer, &tree, &filename).unwrap();
}

#[test]
fn tree_spanning_two_files() {
    let dir = TempDir::new().unwrap();
    let main = path(&dir, "main.tsv");
    let other = path(&dir, "other.itpb");

    let elsewhere = seeded_tree(3, "far", &other, 2);
    let leaf = |name: &str| Child::from(ImageTree::leaf(name, &main, Pixel::new(1, 2, 3).into()));
    let root = ImageTree::new(
        "root",
        &main,
        Pixel::new(0, 0, 0).into(),
        vec![Child::from(elsewhere), leaf("a"), leaf("b"), leaf("c")],
    )
    .unwrap();

    let mut written = save_tree(&Serializer::default(), &root).unwrap();
    written.sort();
    let mut expected = vec![main.clone(), other.clone()];
    expected.sort();
    assert_eq!(written, expected);

    let reader = Serializer::default();
    let loaded = reader.load_node(&format!("root@{}", main)).unwrap();
    assert_eq!(loaded.children_links()[0], format!("far@{}", other));
    assert_eq!(loaded.count_nodes(&reader).unwrap(), 4 + 5);
    assert_eq!(reader.loaded_files().len(), 2);
}

#[test]
fn cyclic_tree_saves_loads_and_renders() {
    let dir = TempDir::new().unwrap();
    let filename = path(&dir, "loop.tsv");
    let leaf = |name: &str, r| Child::from(ImageTree::leaf(name, &filename, Pixel::new(r, 0, 0).into()));
    let root = ImageTree::new(
        "loop",
        &filename,
        Pixel::new(0, 0, 250).into(),
        vec![
            Child::Link(format!("loop@{}", filename)),
            leaf("a", 10),
            leaf("b", 20),
            leaf("c", 30),
        ],
    )
    .unwrap();

    let memory = MemoryPersistence::default();
    memory.put_tree(root.clone()).unwrap();
    save_tree(&memory, &root).unwrap();

    let reader = Serializer::default();
    let loaded = reader.load_node(&format!("loop@{}", filename)).unwrap();
    assert_eq!(loaded.count_nodes(&reader).unwrap(), 4);
    assert_eq!(loaded.height(&reader, 6).unwrap(), 6);

    let image = loaded.get_image(&reader, 8).unwrap();
    assert_eq!(image.get_pixel(7, 7).0, [30, 0, 0]);
    assert_eq!(image.get_pixel(0, 7).0, [20, 0, 0]);
    assert_eq!(image.get_pixel(3, 0).0, [10, 0, 0]);
    assert_eq!(image.get_pixel(0, 0).0, [0, 0, 250]);
}

#[test]
fn missing_nodes_load_as_placeholder() {
    let dir = TempDir::new().unwrap();
    let filename = path(&dir, "absent.tsv");
    let serializer = Serializer::default();
    let tree = serializer.load_node(&format!("ghost@{}", filename)).unwrap();
    assert_eq!(tree.name(), "standard_nodes.not_found_node");
    assert!(serializer.load_node("a@b@c").is_err());
}
