use graphmap::persistence::ResultCode;
use graphmap::{GraphMap, MemoryPersistence, NodeAddress, Persistence, Serializer};
use tempfile::TempDir;

#[test]
fn build_a_map_from_nodes() {
    let graph_map = GraphMap::new(MemoryPersistence::default());
    let colors: Vec<NodeAddress> = ["red", "green", "blue", "white"]
        .iter()
        .map(|name| {
            graph_map
                .create_node(&NodeAddress::anonymous(*name), None, &[])
                .unwrap()
        })
        .collect();
    let links: Vec<String> = colors.iter().map(NodeAddress::to_string).collect();
    let root = graph_map
        .create_node(&NodeAddress::anonymous("world"), None, &links)
        .unwrap();

    assert_eq!(graph_map.get_child_name(&root, "2").unwrap(), colors[2]);

    let zoomed = graph_map
        .connect_child(&root, "30", &colors[0], Some(NodeAddress::anonymous("world2")))
        .unwrap();
    assert_eq!(graph_map.get_child_name(&zoomed, "30").unwrap(), colors[0]);
    assert_eq!(
        graph_map.get_child_name(&zoomed, "3").unwrap(),
        NodeAddress::anonymous("world23")
    );
    assert_eq!(graph_map.get_child_name(&root, "3").unwrap(), colors[3]);

    let failure = graph_map.get_child_name(&root, "33").unwrap_err();
    assert_eq!(failure.code, ResultCode::NodeLinkNotFound);
    assert_eq!(graph_map.all_node_links().len(), 6);
}

#[test]
fn disk_backed_graph_map() {
    let dir = TempDir::new().unwrap();
    let filename = dir.path().join("leaf.tsv").display().to_string();
    let graph_map = GraphMap::new(Serializer::default());
    let address = NodeAddress::in_file("leaf", &filename);

    graph_map
        .create_node(&address, Some("http://a.com/b.png"), &[])
        .unwrap();
    assert!(graph_map.node_exists(&address));
    assert!(graph_map.persistence().get_tree(&address).is_ok());

    let failure = graph_map.create_node(&address, None, &[]).unwrap_err();
    assert_eq!(failure.code, ResultCode::NameAlreadyExists);
}
