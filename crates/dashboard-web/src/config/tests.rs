#[cfg(test)]
mod tests {
    use super::super::*;
    use dashboard_stats::DimensionKind;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.server.bind_addr, "127.0.0.1:5000");
        assert!(config.server.cors_permissive);
        assert_eq!(config.deriva.servername, "localhost");
        assert_eq!(config.deriva.default_catalog_id, "1");
        assert_eq!(config.deriva.registry_catalog_id, "registry");
        assert!(config.deriva.pass_headers);
        assert!(config.deriva.dev_token.is_none());
        assert_eq!(config.stats.merge_policy, MergePolicy::Local);
        assert_eq!(config.stats.dcc_identity, DccIdentity::ProjectNid);
    }

    #[test]
    fn test_serde_defaults_match_default_impl() {
        let parsed = Config::parse("[server]\n[deriva]\n[stats]\n").unwrap();
        let built = Config::default();
        assert_eq!(parsed.server.bind_addr, built.server.bind_addr);
        assert_eq!(parsed.deriva.request_timeout_secs, built.deriva.request_timeout_secs);
        assert_eq!(parsed.deriva.pass_headers, built.deriva.pass_headers);
    }

    #[test]
    fn test_overrides_from_toml() {
        let config = Config::parse(r#"
            [server]
            bind_addr = "0.0.0.0:8080"
            cors_permissive = false

            [deriva]
            servername = "app-staging.nih-cfde.org"
            default_catalog_id = "4"
            dev_token = "abc123"
            request_timeout_secs = 5

            [stats]
            merge_policy = "global"
            dcc_identity = "nid"
        "#).unwrap();
        assert_eq!(config.server.bind_addr, "0.0.0.0:8080");
        assert!(!config.server.cors_permissive);
        assert_eq!(config.deriva.default_catalog_id, "4");
        assert_eq!(config.deriva.registry_catalog_id, "registry");
        assert_eq!(config.stats.merge_policy, MergePolicy::Global);
        assert_eq!(config.stats.dcc_identity, DccIdentity::Nid);

        let settings = config.catalog_settings();
        assert_eq!(settings.servername, "app-staging.nih-cfde.org");
        assert_eq!(settings.dev_token.as_deref(), Some("abc123"));
        assert_eq!(settings.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_dimension_overrides_extend_registry() {
        let config = Config::parse(r#"
            [[stats.dimensions]]
            name = "anatomy"
            table = "anatomy"
            label_column = "synonyms"

            [[stats.dimensions]]
            name = "platform"
            aliases = ["instrument"]
            table = "platform"
            fk_column = "platform_nid"
        "#).unwrap();
        let registry = config.dimension_registry();
        assert_eq!(registry.resolve("anatomy").unwrap().label_column, "synonyms");
        let platform = registry.resolve("instrument").unwrap();
        assert_eq!(platform.name, "platform");
        assert_eq!(platform.fk_column(), "platform_nid");
        assert_eq!(platform.kind, DimensionKind::Vocabulary);
        assert!(registry.resolve("dcc").is_some());
    }

    #[test]
    fn test_bad_merge_policy_rejected() {
        assert!(Config::parse("[stats]\nmerge_policy = \"median\"\n").is_err());
    }

    #[test]
    fn test_empty_default_catalog_rejected() {
        let err = Config::parse("[deriva]\ndefault_catalog_id = \"\"\n").unwrap_err();
        assert!(err.to_string().contains("default_catalog_id"));
    }
}
