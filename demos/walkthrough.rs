use vfs_catalog::{Catalog, CatalogError, DirStorage, ErrorKind};

fn main() -> anyhow::Result<()> {
    let tmp = std::env::temp_dir();
    println!("Temp dir: {}", tmp.display());

    // creates `/tmp/catalog_walkthrough` on host;
    // everything created through the storage is removed again on drop
    let mut storage = DirStorage::new(tmp.join("catalog_walkthrough"))?;
    storage.set_auto_clean(true);
    let mut catalog = Catalog::new(storage);

    // creates `docs` and `backup` on host first, then records them
    catalog.make_directory("docs")?;
    catalog.make_directory("backup")?;

    catalog.create_file("docs", "hello.txt")?;
    catalog.write_content("docs", "hello.txt", "Hello, World!")?;

    // the copy is a separate record in `backup`
    catalog.copy_file("docs", "backup", "hello.txt")?;
    catalog.rename_file("backup", "hello.txt", "hello.bak")?;

    catalog.change_directory("docs")?;
    println!("Current directory: {:?}", catalog.current_directory());

    for dir in catalog.directories() {
        let files: Vec<_> = catalog.list_files(dir)?.collect();
        println!("{}: {:?}", dir, files);
    }

    // the content is read back from the host, chunk by chunk
    let content = catalog.read_file("docs", "hello.txt")?.read_to_end()?;
    println!("{}", String::from_utf8_lossy(&content));

    println!("hello.txt found in {:?}", catalog.find_file("hello.txt"));

    // errors are values; presenting them is up to the caller
    report(catalog.create_file("missing", "a.txt"));
    report(catalog.make_directory("docs"));

    catalog.remove_file("docs", "hello.txt")?;
    catalog.remove_directory("docs")?;
    println!("Directories left: {:?}", catalog.directories().collect::<Vec<_>>());

    Ok(())
}

fn report(result: Result<(), CatalogError>) {
    if let Err(e) = result {
        let kind = match e.kind() {
            ErrorKind::NotFound => "not found",
            ErrorKind::CapacityExceeded => "full",
            ErrorKind::NameCollision => "exists",
            ErrorKind::InvalidInput => "invalid",
            ErrorKind::DurableStorage => "storage",
        };
        println!("[{}] {}", kind, e);
    }
}
