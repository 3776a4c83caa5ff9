// tests/property_files.rs

use std::collections::BTreeSet;
use std::path::PathBuf;

use proptest::prelude::*;

use pipework::files::FilesBuilder;
use pipework::paths::AbsolutePath;

fn relative_path() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-c]{1,2}", 1..4).prop_map(|parts| parts.join("/"))
}

proptest! {
    #[test]
    fn built_files_are_sorted_unique_and_order_independent(
        paths in prop::collection::vec(relative_path(), 0..20),
    ) {
        let root = AbsolutePath::new("/root").unwrap();

        let mut forward = FilesBuilder::new(root.clone());
        forward.add_all(&paths).unwrap();
        let forward = forward.build().unwrap();

        let mut reversed = FilesBuilder::new(root.clone());
        reversed.add_all(paths.iter().rev()).unwrap();
        let reversed = reversed.build().unwrap();

        prop_assert_eq!(&forward, &reversed);

        let expected: Vec<PathBuf> = paths
            .iter()
            .map(PathBuf::from)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        prop_assert_eq!(forward.to_vec(), expected);

        for absolute in forward.absolute_paths() {
            prop_assert!(absolute.relative_to(&root).is_some());
        }
    }

    #[test]
    fn mutating_a_copy_leaves_the_set_alone(
        paths in prop::collection::vec(relative_path(), 1..12),
        extra in relative_path(),
    ) {
        let mut builder = FilesBuilder::new(AbsolutePath::new("/root").unwrap());
        builder.add_all(&paths).unwrap();
        let files = builder.build().unwrap();
        let before = files.to_vec();

        let mut copy = files.to_vec();
        copy.push(PathBuf::from(&extra));
        copy.remove(0);
        copy.reverse();

        prop_assert_eq!(files.to_vec(), before.clone());
        prop_assert_eq!(files.len(), before.len());
        for path in &before {
            prop_assert!(files.contains(path));
        }
    }

    #[test]
    fn escaping_paths_never_get_in(depth in 1usize..4, name in "[a-z]{1,5}") {
        let root = AbsolutePath::new("/root/deep/dir").unwrap();
        let escape = format!("{}{name}", "../".repeat(depth));

        let mut builder = FilesBuilder::new(root);
        prop_assert!(builder.add(&escape).is_err());
        prop_assert!(builder.build().unwrap().is_empty());
    }
}
