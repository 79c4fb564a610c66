//! End-to-end tests: configuration to topology to template to deployment

mod common;

use common::{resolver, stack_config, NLB_ARN, NLB_DNS};
use gatelink::domain::{
    AccessRequest, Decision, GatewayDefinition, HttpMethod, MethodLoggingLevel, Visibility,
    ENDPOINT_URL_OUTPUT,
};
use gatelink::engine::{DeploymentEngine, FileSystemEngine, OutputRegistry};
use gatelink::template::synth::{method_logical_id, STAGE_TYPE};
use gatelink::{build_topology, synthesize, GatelinkError, Template};
use serde_json::json;
use tempfile::TempDir;

#[test]
fn reference_stack_builds() {
    let topology = build_topology(stack_config(), resolver()).unwrap();

    assert_eq!(topology.identity.name, "DocumentConverterApiGWStack");
    assert_eq!(topology.link.description(), "VpcLink towards NLB");
    assert_eq!(topology.link.target_arns(), vec![NLB_ARN]);

    let gateway = topology.gateway();
    assert_eq!(gateway.visibility(), Visibility::Private);
    assert_eq!(gateway.description(), "Api Gateway for DocumentConverter");
    assert_eq!(gateway.methods(), vec![HttpMethod::Get, HttpMethod::Post]);
    for integration in gateway.integrations() {
        assert_eq!(integration.path_part, "{proxy+}");
        assert_eq!(integration.uri(), format!("http://{}/{{proxy}}", NLB_DNS));
        assert_eq!(integration.link, *topology.link.id());
    }

    let logging = topology.stage.logging();
    assert_eq!(topology.stage.name(), "DEV");
    assert_eq!(logging.sink.name, "/api-gw/DocumentConverter");
    assert_eq!(logging.sink.retention_days, 7);
    assert_eq!(logging.level, MethodLoggingLevel::Info);
    assert!(logging.data_trace);

    assert_eq!(
        topology.endpoint_url,
        "https://${RestApiGw}.execute-api.us-east-1.amazonaws.com/DEV/"
    );
    assert_eq!(topology.outputs.len(), 1);
    assert_eq!(topology.outputs[0].name, ENDPOINT_URL_OUTPUT);
    assert_eq!(topology.permissions_boundary.as_deref(), Some("Core-PermissionBoundaryPolicy"));
}

#[test]
fn policy_admits_only_allowed_sources() {
    let topology = build_topology(stack_config(), resolver()).unwrap();
    let policy = topology.gateway().policy();

    let inside = AccessRequest::invoke("10.1.2.3".parse().unwrap(), "DEV", "GET", "/docs");
    let outside = AccessRequest::invoke("192.168.1.1".parse().unwrap(), "DEV", "GET", "/docs");
    assert_eq!(policy.evaluate(&inside), Decision::Allow);
    assert_eq!(policy.evaluate(&outside), Decision::ExplicitDeny);
}

#[test]
fn unknown_endpoint_is_not_found() {
    let mut config = stack_config();
    config.target_endpoint_handle = "nlb-unknown".to_string();

    let err = build_topology(config, resolver()).unwrap_err();
    assert!(matches!(err, GatelinkError::NotFound { ref handle, .. } if handle == "nlb-unknown"));
}

#[test]
fn no_methods_fails_at_deploy() {
    let mut config = stack_config();
    config.methods.clear();

    let err = build_topology(config, resolver()).unwrap_err();
    assert!(matches!(err, GatelinkError::Deployment { .. }));
}

#[test]
fn invalid_configuration_fails_before_resolution() {
    let mut config = stack_config();
    config.allowed_source_ips = vec!["10.0.0.0/33".to_string()];
    assert!(matches!(
        build_topology(config, resolver()),
        Err(GatelinkError::Validation { .. })
    ));
}

#[test]
fn empty_allow_list_denies_everyone() {
    let mut config = stack_config();
    config.allowed_source_ips.clear();

    let topology = build_topology(config, resolver()).unwrap();
    let request = AccessRequest::invoke("10.1.2.3".parse().unwrap(), "DEV", "GET", "/");
    assert_eq!(topology.gateway().policy().evaluate(&request), Decision::ExplicitDeny);
}

#[test]
fn gateway_definition_round_trips() {
    let topology = build_topology(stack_config(), resolver()).unwrap();
    let json = topology.gateway().to_json().unwrap();
    let parsed = GatewayDefinition::from_json(&json).unwrap();
    assert_eq!(&parsed, topology.gateway());
}

#[test]
fn template_wires_every_resource() {
    let topology = build_topology(stack_config(), resolver()).unwrap();
    let template = synthesize(&topology).unwrap();
    template.check_references().unwrap();

    let api = template.resource("RestApiGw").unwrap();
    assert_eq!(api.properties["EndpointConfiguration"]["Types"], json!(["PRIVATE"]));
    assert_eq!(api.properties["Policy"]["Statement"][1]["Effect"], "Deny");

    let get = template.resource(&method_logical_id("RestApiGw", HttpMethod::Get)).unwrap();
    let integration = &get.properties["Integration"];
    assert_eq!(integration["Type"], "HTTP_PROXY");
    assert_eq!(integration["ConnectionType"], "VPC_LINK");
    assert_eq!(integration["ConnectionId"], json!({ "Ref": "VpcLink" }));
    assert_eq!(integration["PassthroughBehavior"], "WHEN_NO_MATCH");
    assert_eq!(
        integration["RequestParameters"],
        json!({ "integration.request.path.proxy": "method.request.path.proxy" })
    );
    assert_eq!(get.properties["RequestParameters"], json!({ "method.request.path.proxy": true }));

    let deployment = template.resource("RestApiGwDeployment").unwrap();
    assert_eq!(deployment.depends_on.len(), 2);

    let (_, stage) = template.resources_of_type(STAGE_TYPE).next().unwrap();
    assert_eq!(stage.properties["StageName"], "DEV");
    assert_eq!(stage.properties["MethodSettings"][0]["LoggingLevel"], "INFO");
    assert_eq!(stage.properties["MethodSettings"][0]["DataTraceEnabled"], true);

    let log_group = template.resource("ApiGwLogGroup").unwrap();
    assert_eq!(log_group.properties["LogGroupName"], "/api-gw/DocumentConverter");
    assert_eq!(log_group.properties["RetentionInDays"], 7);

    let role = template.resource("RestApiGwCloudWatchRole").unwrap();
    assert!(role.properties["PermissionsBoundary"]["Fn::Sub"]
        .as_str()
        .unwrap()
        .ends_with(":policy/Core-PermissionBoundaryPolicy"));

    let output = &template.outputs[ENDPOINT_URL_OUTPUT];
    assert_eq!(output.export.as_ref().unwrap().name, ENDPOINT_URL_OUTPUT);
}

#[test]
fn logging_role_is_optional() {
    let mut config = stack_config();
    config.cloud_watch_role = false;

    let template = synthesize(&build_topology(config, resolver()).unwrap()).unwrap();
    assert!(template.resource("RestApiGwCloudWatchRole").is_none());
    assert!(template.resource("RestApiGwAccount").is_none());
    template.check_references().unwrap();
}

#[test]
fn template_yaml_parses_back() {
    let template = synthesize(&build_topology(stack_config(), resolver()).unwrap()).unwrap();
    let parsed = Template::from_yaml(&template.to_yaml().unwrap()).unwrap();
    assert_eq!(parsed, template);
}

#[tokio::test]
async fn deploy_publishes_resolved_url() {
    let dir = TempDir::new().unwrap();
    let topology = build_topology(stack_config(), resolver()).unwrap();
    let template = synthesize(&topology).unwrap();

    let engine = FileSystemEngine::new(dir.path());
    let receipt = engine.submit(&topology.identity, &template).await.unwrap();

    let gateway_id = FileSystemEngine::physical_id("DocumentConverterApiGWStack", "RestApiGw");
    let expected = format!("https://{}.execute-api.us-east-1.amazonaws.com/DEV/", gateway_id);
    assert_eq!(receipt.output(ENDPOINT_URL_OUTPUT), Some(expected.as_str()));

    let (owner, export) = OutputRegistry::new(dir.path())
        .find_export(ENDPOINT_URL_OUTPUT)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(owner, "DocumentConverterApiGWStack");
    assert_eq!(export.value, expected);
}

#[tokio::test]
async fn second_stack_cannot_reuse_export() {
    let dir = TempDir::new().unwrap();
    let engine = FileSystemEngine::new(dir.path());

    let first = build_topology(stack_config(), resolver()).unwrap();
    engine.submit(&first.identity, &synthesize(&first).unwrap()).await.unwrap();

    let mut config = stack_config();
    config.application_name = "ImageResizer".to_string();
    let second = build_topology(config, resolver()).unwrap();

    let err = engine.submit(&second.identity, &synthesize(&second).unwrap()).await.unwrap_err();
    assert!(matches!(err, GatelinkError::ProviderRejected { ref stack, .. } if stack == "ImageResizerApiGWStack"));
}

#[tokio::test]
async fn unsupported_retention_is_a_provider_error() {
    let dir = TempDir::new().unwrap();
    let mut config = stack_config();
    config.log_retention_days = 10;

    let topology = build_topology(config, resolver()).unwrap();
    let err = FileSystemEngine::new(dir.path())
        .submit(&topology.identity, &synthesize(&topology).unwrap())
        .await
        .unwrap_err();
    assert!(!err.is_local());
}
