//! AWS SDK KMS client initialisation.

use aws_config::BehaviorVersion;
use tracing::debug;

/// Initialise a KMS client from the default AWS configuration chain.
///
/// When `endpoint_url` is set, all KMS calls are sent there instead of the
/// regional endpoint; credentials are still resolved via the standard chain
/// (environment, profile, IMDS, ...).
pub async fn kms_client(endpoint_url: Option<&str>) -> aws_sdk_kms::Client {
    let config = aws_config::defaults(BehaviorVersion::latest()).load().await;

    let mut builder = aws_sdk_kms::config::Builder::from(&config);
    if let Some(url) = endpoint_url {
        debug!(endpoint_url = url, "overriding KMS endpoint");
        builder = builder.endpoint_url(url);
    }

    aws_sdk_kms::Client::from_conf(builder.build())
}
