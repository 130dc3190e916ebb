//! Webhook registration
//!
//! Describes how the API server should reach the Deployment validator. The
//! owner of the process applies the resulting `ValidatingWebhookConfiguration`;
//! nothing here talks to the cluster.

use k8s_openapi::api::admissionregistration::v1::{
    RuleWithOperations, ServiceReference, ValidatingWebhook, ValidatingWebhookConfiguration,
    WebhookClientConfig,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;

use webapp_common::{API_GROUP, API_VERSION};

/// Path the Deployment validator is served on
pub const VALIDATE_DEPLOYMENT_PATH: &str = "/validate-webapp-my-domain-v1-deployment";

/// Name of the webhook entry
pub const VALIDATE_DEPLOYMENT_WEBHOOK: &str = "vdeployment.kb.io";

/// Default name of the `ValidatingWebhookConfiguration`
pub const DEFAULT_CONFIGURATION_NAME: &str = "webapp-validating-webhook-configuration";

/// Default Service fronting the webhook server
pub const DEFAULT_SERVICE_NAME: &str = "webapp-webhook-service";

/// Default namespace of the webhook Service
pub const DEFAULT_NAMESPACE: &str = "webapp-system";

/// Default Service port
pub const DEFAULT_SERVICE_PORT: i32 = 443;

/// Where the webhook Service lives and how to trust it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebhookRegistration {
    /// Name of the `ValidatingWebhookConfiguration` object
    pub configuration_name: String,
    /// Service fronting the webhook server
    pub service_name: String,
    /// Namespace of that Service
    pub namespace: String,
    /// Service port
    pub port: i32,
    /// PEM encoded CA that signed the serving certificate
    pub ca_bundle: Option<Vec<u8>>,
}

impl Default for WebhookRegistration {
    fn default() -> Self {
        Self {
            configuration_name: DEFAULT_CONFIGURATION_NAME.to_string(),
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            port: DEFAULT_SERVICE_PORT,
            ca_bundle: None,
        }
    }
}

impl WebhookRegistration {
    /// Build the configuration that routes Deployment CREATE/UPDATE to the validator
    ///
    /// Failures of the webhook reject the request (`failurePolicy: Fail`), and
    /// the webhook declares no side effects so dry-run requests reach it.
    pub fn validating_webhook_configuration(&self) -> ValidatingWebhookConfiguration {
        ValidatingWebhookConfiguration {
            metadata: ObjectMeta {
                name: Some(self.configuration_name.clone()),
                ..Default::default()
            },
            webhooks: Some(vec![ValidatingWebhook {
                name: VALIDATE_DEPLOYMENT_WEBHOOK.to_string(),
                admission_review_versions: vec!["v1".to_string()],
                side_effects: "None".to_string(),
                failure_policy: Some("Fail".to_string()),
                rules: Some(vec![RuleWithOperations {
                    operations: Some(vec!["CREATE".to_string(), "UPDATE".to_string()]),
                    api_groups: Some(vec![API_GROUP.to_string()]),
                    api_versions: Some(vec![API_VERSION.to_string()]),
                    resources: Some(vec!["deployments".to_string()]),
                    scope: None,
                }]),
                client_config: WebhookClientConfig {
                    service: Some(ServiceReference {
                        name: self.service_name.clone(),
                        namespace: self.namespace.clone(),
                        path: Some(VALIDATE_DEPLOYMENT_PATH.to_string()),
                        port: Some(self.port),
                    }),
                    ca_bundle: self.ca_bundle.clone().map(ByteString),
                    ..Default::default()
                },
                ..Default::default()
            }]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only_webhook(config: &ValidatingWebhookConfiguration) -> &ValidatingWebhook {
        let webhooks = config.webhooks.as_ref().expect("webhooks");
        assert_eq!(webhooks.len(), 1);
        &webhooks[0]
    }

    #[test]
    fn test_default_registration_matches_served_endpoint() {
        let config = WebhookRegistration::default().validating_webhook_configuration();
        assert_eq!(
            config.metadata.name.as_deref(),
            Some(DEFAULT_CONFIGURATION_NAME)
        );

        let webhook = only_webhook(&config);
        assert_eq!(webhook.name, "vdeployment.kb.io");
        assert_eq!(webhook.failure_policy.as_deref(), Some("Fail"));
        assert_eq!(webhook.side_effects, "None");
        assert_eq!(webhook.admission_review_versions, vec!["v1".to_string()]);

        let service = webhook.client_config.service.as_ref().expect("service");
        assert_eq!(service.name, DEFAULT_SERVICE_NAME);
        assert_eq!(service.namespace, DEFAULT_NAMESPACE);
        assert_eq!(
            service.path.as_deref(),
            Some("/validate-webapp-my-domain-v1-deployment")
        );
        assert_eq!(service.port, Some(443));
        assert!(webhook.client_config.ca_bundle.is_none());
    }

    #[test]
    fn test_rules_cover_create_and_update_only() {
        let config = WebhookRegistration::default().validating_webhook_configuration();
        let rules = only_webhook(&config).rules.as_ref().expect("rules");
        assert_eq!(rules.len(), 1);

        let rule = &rules[0];
        assert_eq!(
            rule.operations,
            Some(vec!["CREATE".to_string(), "UPDATE".to_string()])
        );
        assert_eq!(rule.api_groups, Some(vec!["webapp.my.domain".to_string()]));
        assert_eq!(rule.api_versions, Some(vec!["v1".to_string()]));
        assert_eq!(rule.resources, Some(vec!["deployments".to_string()]));
    }

    #[test]
    fn test_custom_service_and_ca_bundle() {
        let registration = WebhookRegistration {
            service_name: "hooks".to_string(),
            namespace: "platform".to_string(),
            port: 9443,
            ca_bundle: Some(b"-----BEGIN CERTIFICATE-----".to_vec()),
            ..Default::default()
        };
        let config = registration.validating_webhook_configuration();
        let webhook = only_webhook(&config);

        let service = webhook.client_config.service.as_ref().unwrap();
        assert_eq!(service.name, "hooks");
        assert_eq!(service.namespace, "platform");
        assert_eq!(service.port, Some(9443));
        assert_eq!(
            webhook.client_config.ca_bundle,
            Some(ByteString(b"-----BEGIN CERTIFICATE-----".to_vec()))
        );
    }

    #[test]
    fn test_configuration_serializes_with_camel_case_keys() {
        let config = WebhookRegistration::default().validating_webhook_configuration();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["kind"], "ValidatingWebhookConfiguration");
        assert_eq!(json["webhooks"][0]["failurePolicy"], "Fail");
        assert_eq!(json["webhooks"][0]["sideEffects"], "None");
        assert_eq!(
            json["webhooks"][0]["clientConfig"]["service"]["path"],
            VALIDATE_DEPLOYMENT_PATH
        );
    }
}
