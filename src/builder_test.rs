#[cfg(test)]
mod tests {
    use crate::apis::{Builder, BuilderSpec, BuilderUpdatePolicy, Image, ImageSpec};
    use crate::client_utils::{gvk_of, gvr_of};
    use crate::{Clientset, ClientsetBuilder, Error};
    use kube::api::{GetParams, ListParams, PostParams};
    use serde_json::json;

    fn builder(name: &str, namespace: &str) -> Builder {
        let mut builder = Builder::new(
            name,
            BuilderSpec {
                image: "cloudfoundry/cnb:bionic".to_string(),
                update_policy: Some(BuilderUpdatePolicy::Polling),
            },
        );
        builder.metadata.namespace = Some(namespace.to_string());
        builder
    }

    #[test]
    fn test_builder_with_objects() {
        let clientset = ClientsetBuilder::new()
            .with_objects(vec![builder("a", "build"), builder("b", "build")])
            .build()
            .unwrap();

        let list = clientset
            .build_v1alpha1()
            .builders("build")
            .list(&ListParams::default())
            .unwrap();
        let names: Vec<_> = list
            .items
            .iter()
            .map(|b| b.metadata.name.clone().unwrap())
            .collect();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_seeding_is_not_recorded() {
        let clientset = ClientsetBuilder::new()
            .with_object(builder("a", "build"))
            .build()
            .unwrap();
        assert!(clientset.actions().is_empty());
    }

    #[test]
    fn test_seeded_object_keeps_resource_version() {
        let mut seeded = builder("a", "build");
        seeded.metadata.resource_version = Some("42".to_string());

        let clientset = ClientsetBuilder::new().with_object(seeded).build().unwrap();
        let found = clientset
            .build_v1alpha1()
            .builders("build")
            .get("a", &GetParams::default())
            .unwrap();
        assert_eq!(found.metadata.resource_version.as_deref(), Some("42"));
    }

    #[test]
    fn test_with_runtime_objects() {
        let clientset = ClientsetBuilder::new()
            .with_runtime_objects(vec![json!({
                "apiVersion": "build.pivotal.io/v1alpha1",
                "kind": "Image",
                "metadata": {"name": "petclinic", "namespace": "build"},
                "spec": {"tag": "registry.example.com/petclinic", "builderRef": "default-builder"}
            })])
            .build()
            .unwrap();

        let image = clientset
            .build_v1alpha1()
            .images("build")
            .get("petclinic", &GetParams::default())
            .unwrap();
        assert_eq!(image.spec.builder_ref, "default-builder");
    }

    #[test]
    fn test_runtime_object_without_kind_fails_build() {
        let result = ClientsetBuilder::new()
            .with_runtime_objects(vec![json!({"metadata": {"name": "orphan"}})])
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_status_subresource_registered() {
        let clientset = Clientset::new();
        assert!(clientset.tracker().has_status_subresource(&gvk_of::<Builder>()));
        assert!(clientset.tracker().has_status_subresource(&gvk_of::<Image>()));
    }

    #[test]
    fn test_user_reactor_runs_before_tracker() {
        let clientset = ClientsetBuilder::new()
            .with_object(builder("a", "build"))
            .with_reactor("get", "builders", |action| {
                Ok(Some(json!({
                    "apiVersion": "build.pivotal.io/v1alpha1",
                    "kind": "Builder",
                    "metadata": {"name": action.name(), "namespace": action.namespace()},
                    "spec": {"image": "from-reactor"}
                })))
            })
            .build()
            .unwrap();

        let found = clientset
            .build_v1alpha1()
            .builders("build")
            .get("a", &GetParams::default())
            .unwrap();
        assert_eq!(found.spec.image, "from-reactor");
    }

    #[test]
    fn test_typed_clients_share_one_recorder() {
        let clientset = Clientset::default();
        let client = clientset.build_v1alpha1();

        client
            .builders("build")
            .create(&builder("a", "build"), &PostParams::default())
            .unwrap();
        let mut image = Image::new(
            "petclinic",
            ImageSpec {
                tag: "registry.example.com/petclinic".to_string(),
                builder_ref: "a".to_string(),
                ..Default::default()
            },
        );
        image.metadata.namespace = Some("build".to_string());
        clientset
            .build_v1alpha1()
            .images("build")
            .create(&image, &PostParams::default())
            .unwrap();

        let resources: Vec<_> = clientset
            .actions()
            .iter()
            .map(|a| a.resource().resource.clone())
            .collect();
        assert_eq!(resources, vec!["builders".to_string(), "images".to_string()]);

        clientset.clear_actions();
        assert!(clientset.actions().is_empty());
        assert_eq!(
            clientset
                .tracker()
                .list(&gvr_of::<Image>(), Some("build"))
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_load_fixture_multi_document() {
        let clientset = ClientsetBuilder::new()
            .with_fixture_dir("fixtures")
            .load_fixture("builders.yaml")
            .unwrap()
            .build()
            .unwrap();
        let client = clientset.build_v1alpha1();

        // No namespace in the fixture, so it lands in default.
        let default_builder = client
            .builders("default")
            .get("default-builder", &GetParams::default())
            .unwrap();
        assert_eq!(
            default_builder.spec.update_policy,
            Some(BuilderUpdatePolicy::Polling)
        );

        let cflinuxfs3 = client
            .builders("build")
            .get("cflinuxfs3-builder", &GetParams::default())
            .unwrap();
        assert_eq!(cflinuxfs3.spec.image, "cloudfoundry/cnb:cflinuxfs3");
    }

    #[test]
    fn test_load_fixtures() {
        let clientset = ClientsetBuilder::new()
            .with_fixture_dir("fixtures")
            .load_fixtures(["builders.yaml", "image.yaml"])
            .unwrap()
            .build()
            .unwrap();

        let image = clientset
            .build_v1alpha1()
            .images("build")
            .get("petclinic", &GetParams::default())
            .unwrap();
        assert_eq!(image.spec.service_account.as_deref(), Some("build-service"));
        assert_eq!(
            image.spec.source.git.map(|git| git.revision).as_deref(),
            Some("main")
        );
        assert_eq!(image.spec.build.unwrap().env[0].value, "11");
    }

    #[test]
    fn test_load_missing_fixture() {
        let result = ClientsetBuilder::new()
            .with_fixture_dir("fixtures")
            .load_fixture("does-not-exist.yaml");
        assert!(matches!(result, Err(Error::Fixture { .. })));
    }

    // JSON object keys must be strings, so a non-empty map keyed by bytes
    // cannot be serialized.
    #[derive(kube::CustomResource, Clone, Debug, Default, serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
    #[kube(group = "test.example.com", version = "v1", kind = "Keyed", namespaced)]
    struct KeyedSpec {
        by_digest: std::collections::BTreeMap<Vec<u8>, String>,
    }

    #[test]
    fn test_unserializable_seed_object_fails_build() {
        let mut keyed = Keyed::new("k", KeyedSpec::default());
        keyed.spec.by_digest.insert(vec![1, 2], "layer".to_string());

        let result = ClientsetBuilder::new()
            .with_object(builder("a", "build"))
            .with_object(keyed)
            .build();
        assert!(matches!(result, Err(Error::SerializationError(_))));
    }

    #[test]
    fn test_first_seed_error_is_kept() {
        let mut first = Keyed::new("first", KeyedSpec::default());
        first.spec.by_digest.insert(vec![1], "a".to_string());
        let mut second = Keyed::new("second", KeyedSpec::default());
        second.spec.by_digest.insert(vec![2], "b".to_string());

        let result = ClientsetBuilder::new()
            .with_objects(vec![first, second])
            .build();
        match result {
            Err(Error::SerializationError(e)) => assert!(e.to_string().contains("key must be a string")),
            Err(other) => panic!("expected serialization error, got {:?}", other),
            Ok(_) => panic!("expected serialization error"),
        }
    }
}
