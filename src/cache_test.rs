#[cfg(test)]
mod tests {
    use crate::apis::{Image, ImageSpec};
    use crate::cache::{list_all, list_all_by_namespace, object_key, store, Indexer, Store, Writer};
    use crate::label_selector::parse_label_selector;
    use kube::core::Selector;
    use kube::runtime::watcher::Event;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn image(namespace: Option<&str>, name: &str, labels: &[(&str, &str)]) -> Image {
        let mut image = Image::new(name, ImageSpec::default());
        image.metadata.namespace = namespace.map(str::to_string);
        if !labels.is_empty() {
            image.metadata.labels = Some(
                labels
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect::<BTreeMap<_, _>>(),
            );
        }
        image
    }

    fn populated(images: Vec<Image>) -> (Store<Image>, Writer<Image>) {
        let (reader, mut writer) = store();
        for image in images {
            writer.apply_watcher_event(&Event::Apply(image));
        }
        (reader, writer)
    }

    fn names<'a>(objects: impl IntoIterator<Item = &'a Arc<Image>>) -> Vec<String> {
        objects
            .into_iter()
            .map(|i| i.metadata.name.clone().unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_object_key() {
        assert_eq!(object_key(&image(Some("a"), "x", &[])).unwrap(), "a/x");
        assert_eq!(object_key(&image(None, "x", &[])).unwrap(), "x");
        assert_eq!(object_key(&image(Some(""), "x", &[])).unwrap(), "x");

        let mut nameless = image(Some("a"), "x", &[]);
        nameless.metadata.name = None;
        assert!(object_key(&nameless).is_err());
    }

    #[test]
    fn test_apply_get_delete() {
        let (reader, mut writer) = populated(vec![image(Some("a"), "x", &[])]);
        assert_eq!(Indexer::list(&reader).len(), 1);

        let found = reader.get_by_key("a/x").unwrap().unwrap();
        assert_eq!(found.metadata.name.as_deref(), Some("x"));
        assert!(reader.get_by_key("b/x").unwrap().is_none());
        assert!(reader.get_by_key("x").unwrap().is_none());

        writer.apply_watcher_event(&Event::Delete(image(Some("a"), "x", &[])));
        assert!(Indexer::list(&reader).is_empty());
        assert!(reader.by_namespace("a").is_empty());
    }

    #[test]
    fn test_cluster_scoped_key() {
        let (reader, _writer) = populated(vec![image(None, "x", &[])]);

        assert!(reader.get_by_key("x").unwrap().is_some());
        assert!(reader.get_by_key("a/x").unwrap().is_none());
        assert_eq!(reader.list_keys(), vec!["x"]);
    }

    #[test]
    fn test_apply_replaces_object() {
        let (reader, mut writer) = populated(vec![image(Some("a"), "x", &[("env", "dev")])]);
        writer.apply_watcher_event(&Event::Apply(image(Some("a"), "x", &[("env", "prod")])));

        assert_eq!(reader.list_keys(), vec!["a/x"]);
        let found = reader.get_by_key("a/x").unwrap().unwrap();
        assert_eq!(
            found.metadata.labels.as_ref().unwrap().get("env").unwrap(),
            "prod"
        );
    }

    #[test]
    fn test_enumeration_is_key_ordered() {
        let (reader, _writer) = populated(
            [("b", "z"), ("a", "y"), ("b", "a"), ("a", "x")]
                .into_iter()
                .map(|(ns, name)| image(Some(ns), name, &[]))
                .collect(),
        );

        assert_eq!(reader.list_keys(), vec!["a/x", "a/y", "b/a", "b/z"]);
        assert_eq!(names(&Indexer::list(&reader)), vec!["x", "y", "a", "z"]);
        assert_eq!(names(&reader.by_namespace("b")), vec!["a", "z"]);
        assert!(reader.by_namespace("c").is_empty());
    }

    #[test]
    fn test_relist_replaces_content() {
        let (reader, mut writer) = populated(vec![image(Some("a"), "stale", &[])]);

        writer.apply_watcher_event(&Event::Init);
        writer.apply_watcher_event(&Event::InitApply(image(Some("b"), "y", &[])));
        writer.apply_watcher_event(&Event::InitApply(image(Some("a"), "x", &[])));
        writer.apply_watcher_event(&Event::InitDone);

        assert_eq!(reader.list_keys(), vec!["a/x", "b/y"]);
        assert_eq!(names(&reader.by_namespace("a")), vec!["x"]);
    }

    #[test]
    fn test_list_all_filters_by_selector() {
        let (reader, _writer) = populated(vec![
            image(Some("a"), "x", &[("env", "prod")]),
            image(Some("a"), "y", &[("env", "dev")]),
            image(Some("b"), "w", &[("env", "prod")]),
        ]);

        let selector = parse_label_selector("env=prod").unwrap();
        let mut visited = Vec::new();
        list_all::<Image, _>(&reader, &selector, |obj| visited.push(obj));
        assert_eq!(names(&visited), vec!["x", "w"]);

        let mut visited = Vec::new();
        list_all_by_namespace::<Image, _>(&reader, "a", &selector, |obj| visited.push(obj));
        assert_eq!(names(&visited), vec!["x"]);

        // An empty namespace covers every namespace.
        let mut visited = Vec::new();
        list_all_by_namespace::<Image, _>(&reader, "", &selector, |obj| visited.push(obj));
        assert_eq!(names(&visited), vec!["x", "w"]);
    }

    #[test]
    fn test_empty_selector_visits_unlabelled_objects() {
        let (reader, _writer) = populated(vec![
            image(Some("a"), "x", &[("env", "prod")]),
            image(Some("a"), "y", &[]),
            image(Some("b"), "w", &[]),
        ]);

        let selector = Selector::default();
        assert!(selector.selects_all());

        let mut visited = Vec::new();
        list_all::<Image, _>(&reader, &selector, |obj| visited.push(obj));
        assert_eq!(names(&visited), vec!["x", "y", "w"]);

        let mut visited = Vec::new();
        list_all_by_namespace::<Image, _>(&reader, "a", &parse_label_selector("").unwrap(), |obj| {
            visited.push(obj)
        });
        assert_eq!(names(&visited), vec!["x", "y"]);

        // A negated requirement still matches objects without labels.
        let mut visited = Vec::new();
        let not_prod = parse_label_selector("env!=prod").unwrap();
        list_all::<Image, _>(&reader, &not_prod, |obj| visited.push(obj));
        assert_eq!(names(&visited), vec!["y", "w"]);
    }
}
