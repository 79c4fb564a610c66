//! Template synthesis
//!
//! Renders a built [`Topology`] into the resource declarations the provider
//! understands. Synthesis never fails on a topology that `build_topology`
//! accepted; the closing reference check guards against wiring mistakes.

use serde_json::{json, Map, Value};
use tracing::{debug, info_span};

use super::intrinsics::{get_att, one_or_many, reference, sub};
use super::{Export, Output, Resource, Template};
use crate::domain::{
    AccessPolicy, DeploymentStage, Effect, GatewayDefinition, HttpMethod, PrivateLink, Principal,
    RouteIntegration, Visibility,
};
use crate::errors::Result;
use crate::topology::Topology;

pub const VPC_LINK_TYPE: &str = "AWS::ApiGateway::VpcLink";
pub const REST_API_TYPE: &str = "AWS::ApiGateway::RestApi";
pub const API_RESOURCE_TYPE: &str = "AWS::ApiGateway::Resource";
pub const METHOD_TYPE: &str = "AWS::ApiGateway::Method";
pub const DEPLOYMENT_TYPE: &str = "AWS::ApiGateway::Deployment";
pub const STAGE_TYPE: &str = "AWS::ApiGateway::Stage";
pub const ACCOUNT_TYPE: &str = "AWS::ApiGateway::Account";
pub const LOG_GROUP_TYPE: &str = "AWS::Logs::LogGroup";
pub const ROLE_TYPE: &str = "AWS::IAM::Role";

const POLICY_VERSION: &str = "2012-10-17";
const PUSH_TO_CLOUDWATCH_POLICY: &str =
    "arn:${AWS::Partition}:iam::aws:policy/service-role/AmazonAPIGatewayPushToCloudWatchLogs";

/// Render the topology as a stack template
pub fn synthesize(topology: &Topology) -> Result<Template> {
    let span = info_span!("synthesize", stack = %topology.identity.name);
    let _guard = span.enter();

    let gateway = topology.gateway();
    let gateway_id = gateway.id().as_str();
    let proxy_resource_id = format!("{}ProxyResource", gateway_id);
    let deployment_id = format!("{}Deployment", gateway_id);
    let role_id = format!("{}CloudWatchRole", gateway_id);
    let account_id = format!("{}Account", gateway_id);

    let mut template = Template::new(Some(gateway.description().to_string()));

    template.add_resource(topology.link.id().as_str(), vpc_link(&topology.link))?;
    template.add_resource(gateway_id, rest_api(gateway))?;
    template.add_resource(
        &proxy_resource_id,
        Resource::new(
            API_RESOURCE_TYPE,
            json!({
                "RestApiId": reference(gateway_id),
                "ParentId": get_att(gateway_id, "RootResourceId"),
                "PathPart": gateway.proxy_path(),
            }),
        ),
    )?;

    let mut method_ids = Vec::with_capacity(gateway.integrations().len());
    for integration in gateway.integrations() {
        let method_id = method_logical_id(gateway_id, integration.method);
        template.add_resource(&method_id, method(gateway_id, &proxy_resource_id, integration))?;
        method_ids.push(method_id);
    }

    template.add_resource(
        &deployment_id,
        Resource::new(
            DEPLOYMENT_TYPE,
            json!({
                "RestApiId": reference(gateway_id),
                "Description": format!("Deployment of {}", gateway.name()),
            }),
        )
        .depends_on(method_ids),
    )?;

    let sink = &topology.stage.logging().sink;
    template.add_resource(
        sink.id.as_str(),
        Resource::new(
            LOG_GROUP_TYPE,
            json!({
                "LogGroupName": sink.name,
                "RetentionInDays": sink.retention_days,
            }),
        ),
    )?;

    let mut stage = stage(gateway_id, &deployment_id, &topology.stage);
    if gateway.cloud_watch_role() {
        template.add_resource(&role_id, cloud_watch_role(topology.permissions_boundary.as_deref()))?;
        template.add_resource(
            &account_id,
            Resource::new(ACCOUNT_TYPE, json!({ "CloudWatchRoleArn": get_att(&role_id, "Arn") }))
                .depends_on(vec![gateway_id.to_string()]),
        )?;
        stage = stage.depends_on(vec![account_id.clone()]);
    }
    template.add_resource(topology.stage.id().as_str(), stage)?;

    for output in &topology.outputs {
        template.add_output(
            &output.name,
            Output {
                value: sub(&output.value),
                description: output.description.clone(),
                export: output.export_name.clone().map(|name| Export { name }),
            },
        )?;
    }

    template.check_references()?;
    debug!(
        resources = template.resources.len(),
        outputs = template.outputs.len(),
        "Template synthesized"
    );
    Ok(template)
}

/// `RestApiGwProxyGetMethod` style id for one method
pub fn method_logical_id(gateway_id: &str, method: HttpMethod) -> String {
    let verb = method.as_str();
    let mut chars = verb.chars();
    let capitalised = match chars.next() {
        Some(first) => first.to_string() + &chars.as_str().to_ascii_lowercase(),
        None => String::new(),
    };
    format!("{}Proxy{}Method", gateway_id, capitalised)
}

fn vpc_link(link: &PrivateLink) -> Resource {
    Resource::new(
        VPC_LINK_TYPE,
        json!({
            "Name": link.id().as_str(),
            "Description": link.description(),
            "TargetArns": link.target_arns(),
        }),
    )
}

fn rest_api(gateway: &GatewayDefinition) -> Resource {
    let endpoint_type = match gateway.visibility() {
        Visibility::Private => "PRIVATE",
        Visibility::Public => "REGIONAL",
    };
    Resource::new(
        REST_API_TYPE,
        json!({
            "Name": gateway.name(),
            "Description": gateway.description(),
            "EndpointConfiguration": { "Types": [endpoint_type] },
            "Policy": policy_document(gateway.policy()),
        }),
    )
}

fn method(gateway_id: &str, proxy_resource_id: &str, integration: &RouteIntegration) -> Resource {
    let method_parameters: Map<String, Value> = integration
        .required_method_parameters()
        .into_iter()
        .map(|name| (name.to_string(), Value::Bool(true)))
        .collect();

    Resource::new(
        METHOD_TYPE,
        json!({
            "RestApiId": reference(gateway_id),
            "ResourceId": reference(proxy_resource_id),
            "HttpMethod": integration.method.as_str(),
            "AuthorizationType": "NONE",
            "RequestParameters": method_parameters,
            "Integration": {
                "Type": "HTTP_PROXY",
                "IntegrationHttpMethod": integration.method.as_str(),
                "Uri": integration.uri(),
                "ConnectionType": "VPC_LINK",
                "ConnectionId": reference(integration.link.as_str()),
                "PassthroughBehavior": integration.passthrough.as_str(),
                "RequestParameters": integration.request_parameters,
            },
        }),
    )
}

fn stage(gateway_id: &str, deployment_id: &str, stage: &DeploymentStage) -> Resource {
    let logging = stage.logging();
    Resource::new(
        STAGE_TYPE,
        json!({
            "RestApiId": reference(gateway_id),
            "DeploymentId": reference(deployment_id),
            "StageName": stage.name(),
            "AccessLogSetting": {
                "DestinationArn": get_att(logging.sink.id.as_str(), "Arn"),
                "Format": logging.access_log_format,
            },
            "MethodSettings": [{
                "ResourcePath": "/*",
                "HttpMethod": "*",
                "LoggingLevel": logging.level.as_str(),
                "DataTraceEnabled": logging.data_trace,
            }],
        }),
    )
}

fn cloud_watch_role(permissions_boundary: Option<&str>) -> Resource {
    let mut properties = json!({
        "AssumeRolePolicyDocument": {
            "Version": POLICY_VERSION,
            "Statement": [{
                "Effect": "Allow",
                "Principal": { "Service": "apigateway.amazonaws.com" },
                "Action": "sts:AssumeRole",
            }],
        },
        "ManagedPolicyArns": [sub(PUSH_TO_CLOUDWATCH_POLICY)],
    });
    if let (Some(boundary), Some(map)) = (permissions_boundary, properties.as_object_mut()) {
        map.insert(
            "PermissionsBoundary".to_string(),
            sub(&format!("arn:${{AWS::Partition}}:iam::${{AWS::AccountId}}:policy/{}", boundary)),
        );
    }
    Resource::new(ROLE_TYPE, properties)
}

/// Render the access policy as an IAM policy document
pub fn policy_document(policy: &AccessPolicy) -> Value {
    let statements: Vec<Value> = policy
        .statements
        .iter()
        .map(|statement| {
            let mut rendered = Map::new();
            let effect = match statement.effect {
                Effect::Allow => "Allow",
                Effect::Deny => "Deny",
            };
            rendered.insert("Effect".to_string(), json!(effect));
            rendered.insert("Principal".to_string(), principal(&statement.principals));
            rendered.insert(
                "Action".to_string(),
                one_or_many(statement.actions.iter().map(|a| json!(a)).collect()),
            );
            rendered.insert(
                "Resource".to_string(),
                one_or_many(statement.resources.iter().map(|r| json!(r)).collect()),
            );

            if !statement.conditions.is_empty() {
                let mut conditions = Map::new();
                for condition in &statement.conditions {
                    let values: Vec<String> =
                        condition.values.iter().map(ToString::to_string).collect();
                    let by_key = conditions
                        .entry(condition.operator.as_str().to_string())
                        .or_insert_with(|| Value::Object(Map::new()));
                    if let Some(by_key) = by_key.as_object_mut() {
                        by_key.insert(condition.key.clone(), json!(values));
                    }
                }
                rendered.insert("Condition".to_string(), Value::Object(conditions));
            }

            Value::Object(rendered)
        })
        .collect();

    json!({ "Version": POLICY_VERSION, "Statement": statements })
}

fn principal(principals: &[Principal]) -> Value {
    if principals.iter().any(|p| matches!(p, Principal::Any)) {
        return json!({ "AWS": "*" });
    }
    let accounts: Vec<Value> = principals
        .iter()
        .filter_map(|p| match p {
            Principal::Account(account) => {
                Some(sub(&format!("arn:${{AWS::Partition}}:iam::{}:root", account)))
            }
            Principal::Any => None,
        })
        .collect();
    json!({ "AWS": one_or_many(accounts) })
}
