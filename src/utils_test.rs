#[cfg(test)]
mod tests {
    use crate::utils::*;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use serde_json::json;

    #[test]
    fn test_next_resource_version() {
        assert_eq!(next_resource_version(None).unwrap(), "1");
        assert_eq!(next_resource_version(Some("")).unwrap(), "1");
        assert_eq!(next_resource_version(Some("1")).unwrap(), "2");
        assert_eq!(next_resource_version(Some("42")).unwrap(), "43");
        assert!(next_resource_version(Some("abc")).is_err());
    }

    #[test]
    fn test_default_metadata_sets_namespace_uid_and_timestamp() {
        let mut meta = ObjectMeta {
            name: Some("builder".to_string()),
            ..Default::default()
        };
        default_metadata(&mut meta, "build");

        assert_eq!(meta.namespace.as_deref(), Some("build"));
        assert!(meta.uid.is_some());
        assert!(meta.creation_timestamp.is_some());
    }

    #[test]
    fn test_default_metadata_keeps_existing_namespace() {
        let mut meta = ObjectMeta {
            namespace: Some("other".to_string()),
            uid: Some("fixed".to_string()),
            ..Default::default()
        };
        default_metadata(&mut meta, "build");

        assert_eq!(meta.namespace.as_deref(), Some("other"));
        assert_eq!(meta.uid.as_deref(), Some("fixed"));
    }

    #[test]
    fn test_is_marked_for_removal_requires_no_finalizers() {
        let mut meta = ObjectMeta::default();
        assert!(!is_marked_for_removal(&meta));

        meta.deletion_timestamp = Some(k8s_openapi::apimachinery::pkg::apis::meta::v1::Time(
            chrono::Utc::now(),
        ));
        assert!(is_marked_for_removal(&meta));

        meta.finalizers = Some(vec!["build.pivotal.io/cleanup".to_string()]);
        assert!(!is_marked_for_removal(&meta));
    }

    #[test]
    fn test_labels_of() {
        let obj = json!({"metadata": {"labels": {"env": "prod", "team": "build"}}});
        let labels = labels_of(&obj);
        assert_eq!(labels.len(), 2);
        assert_eq!(labels.get("env").map(String::as_str), Some("prod"));

        assert!(labels_of(&json!({"metadata": {}})).is_empty());
    }
}
