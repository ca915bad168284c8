//! Error types for dynsh.
//!
//! Maps AWS SDK errors to the shell's error taxonomy using typed `SdkError`
//! variant matching rather than string parsing of debug output.

use aws_sdk_dynamodb::error::SdkError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything a shell command can fail with.
///
/// Remote variants describe a failure reported by (or on the way to) the
/// store; local variants never left the process. `is_remote` tells the two
/// apart.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    ResourceInUse(String),

    #[error("{0}")]
    Validation(String),

    #[error("The condition expression evaluated to false")]
    ConditionalCheckFailed,

    #[error("{0}")]
    Throttled(String),

    #[error("{0}")]
    AccessDenied(String),

    #[error("{0}")]
    Credentials(String),

    #[error("{0}")]
    Connection(String),

    #[error("{0}")]
    Response(String),

    /// A service error code with no dedicated variant.
    #[error("{code}: {message}")]
    Service { code: String, message: String },

    /// A request argument rejected before any remote call was made.
    #[error("{0}")]
    InvalidParameter(String),

    /// A failure local to the process (request construction, shell misuse).
    #[error("{0}")]
    Logic(String),
}

impl Error {
    /// Whether the failure was reported by the remote store (or the network
    /// path to it) as opposed to being raised locally.
    pub fn is_remote(&self) -> bool {
        !matches!(self, Error::InvalidParameter(_) | Error::Logic(_))
    }
}

/// AWS service type for error context.
#[derive(Debug, Clone, Copy)]
pub enum AwsService {
    DynamoDb,
    CloudWatch,
}

impl AwsService {
    fn name(&self) -> &'static str {
        match self {
            AwsService::DynamoDb => "DynamoDB",
            AwsService::CloudWatch => "CloudWatch",
        }
    }
}

/// Map non-service `SdkError` variants (dispatch failures, timeouts, etc.).
///
/// Returns `Some(Error)` for non-service errors, `None` for `ServiceError`.
fn map_outer_sdk_error<E, R>(err: &SdkError<E, R>, service: AwsService) -> Option<Error>
where
    E: std::fmt::Debug,
    R: std::fmt::Debug,
{
    match err {
        SdkError::DispatchFailure(dispatch) => {
            if dispatch.is_timeout() {
                Some(Error::Connection(format!(
                    "Connection to {} timed out. Check the network path or the endpoint URL.",
                    service.name()
                )))
            } else if dispatch.is_io() {
                Some(Error::Connection(format!(
                    "Could not reach {} (I/O error). Is the endpoint reachable?",
                    service.name()
                )))
            } else {
                Some(Error::Connection(format!(
                    "Could not reach {}. Is the endpoint reachable?",
                    service.name()
                )))
            }
        }
        SdkError::TimeoutError(_) => Some(Error::Connection(format!(
            "Connection to {} timed out. Check the network path or the endpoint URL.",
            service.name()
        ))),
        SdkError::ConstructionFailure(err) => {
            let msg = format!("{:?}", err);
            if msg.contains("credentials")
                || msg.contains("Credentials")
                || msg.contains("NoCredentialsError")
            {
                Some(Error::Credentials(
                    "No AWS credentials found. Set AWS_ACCESS_KEY_ID/AWS_SECRET_ACCESS_KEY, \
                    pass --profile, or run under an IAM role."
                        .to_string(),
                ))
            } else {
                Some(Error::Logic(format!("Failed to build request: {}", msg)))
            }
        }
        SdkError::ResponseError(err) => Some(Error::Response(format!(
            "Malformed response from {}: {:?}",
            service.name(),
            err
        ))),
        SdkError::ServiceError(_) => None,
        _ => Some(Error::Response(format!(
            "Unhandled transport error from {}: {:?}",
            service.name(),
            err
        ))),
    }
}

/// Map common service error codes shared across DynamoDB and CloudWatch.
///
/// Returns `Some(Error)` if matched, `None` if the code needs
/// service-specific handling.
fn map_common_service_code(
    code: Option<&str>,
    message: Option<&str>,
    service: AwsService,
) -> Option<Error> {
    let code = code?;

    match code {
        "UnrecognizedClientException" => Some(Error::Credentials(
            "AWS rejected the credentials. Check the access key and secret.".to_string(),
        )),
        "InvalidAccessKeyId" => Some(Error::Credentials(
            "Invalid AWS access key ID.".to_string(),
        )),
        "SignatureDoesNotMatch" => Some(Error::Credentials(
            "AWS signature mismatch. Check the secret access key.".to_string(),
        )),
        "ExpiredTokenException" | "ExpiredToken" => Some(Error::Credentials(
            "AWS credentials have expired. Renew the session token.".to_string(),
        )),
        "AccessDeniedException" | "AccessDenied" => {
            let msg = message.unwrap_or("Check your IAM permissions.");
            Some(Error::AccessDenied(format!(
                "Access denied to {}: {}",
                service.name(),
                msg
            )))
        }
        "ProvisionedThroughputExceededException"
        | "LimitExceededException"
        | "RequestLimitExceeded"
        | "Throttling"
        | "ThrottlingException"
        | "TooManyRequestsException" => Some(Error::Throttled(format!(
            "{} request rate too high. Back off and retry.",
            service.name()
        ))),
        _ => None,
    }
}

/// Map a DynamoDB service error code + message to an `Error`.
fn map_dynamodb_code(
    code: Option<&str>,
    message: Option<&str>,
    display: &str,
    table: Option<&str>,
) -> Error {
    // Cross-service codes first
    if let Some(err) = map_common_service_code(code, message, AwsService::DynamoDb) {
        return err;
    }

    match code {
        Some("ResourceNotFoundException") => {
            let msg = if let Some(t) = table {
                format!("Table '{}' not found", t)
            } else {
                "Resource not found".to_string()
            };
            Error::NotFound(msg)
        }
        Some("ResourceInUseException") => {
            let msg = if let Some(t) = table {
                format!("Table '{}' is being modified", t)
            } else {
                "Resource already in use".to_string()
            };
            Error::ResourceInUse(msg)
        }
        Some("ValidationException") => {
            let msg = message.unwrap_or(display);
            Error::Validation(msg.to_string())
        }
        Some("ConditionalCheckFailedException") => Error::ConditionalCheckFailed,
        Some("ItemCollectionSizeLimitExceededException") => {
            Error::Validation("Item collection size limit exceeded".to_string())
        }
        _ => Error::Service {
            code: code.unwrap_or("UnknownError").to_string(),
            message: message.unwrap_or(display).to_string(),
        },
    }
}

/// Map a CloudWatch service error code + message to an `Error`.
fn map_cloudwatch_code(code: Option<&str>, message: Option<&str>, display: &str) -> Error {
    if let Some(err) = map_common_service_code(code, message, AwsService::CloudWatch) {
        return err;
    }

    match code {
        Some("InvalidParameterValue")
        | Some("InvalidParameterCombination")
        | Some("MissingParameter") => {
            let msg = message.unwrap_or(display);
            Error::Validation(msg.to_string())
        }
        _ => Error::Service {
            code: code.unwrap_or("UnknownError").to_string(),
            message: message.unwrap_or(display).to_string(),
        },
    }
}

/// Map DynamoDB-specific errors using typed `SdkError` variants.
///
/// For `ServiceError`, uses `ProvideErrorMetadata` to get the error code and
/// message instead of parsing debug strings.
pub fn map_dynamodb_error<E, R>(err: SdkError<E, R>, table: Option<&str>) -> Error
where
    E: aws_sdk_dynamodb::error::ProvideErrorMetadata + std::fmt::Debug + std::fmt::Display,
    R: std::fmt::Debug,
{
    // Outer variants (dispatch, timeout) before service metadata
    if let Some(mapped) = map_outer_sdk_error(&err, AwsService::DynamoDb) {
        return mapped;
    }

    if let Some(service_err) = err.as_service_error() {
        let meta = aws_sdk_dynamodb::error::ProvideErrorMetadata::meta(service_err);
        let code = meta.code();
        let message = meta.message();
        let display = service_err.to_string();
        return map_dynamodb_code(code, message, &display, table);
    }

    // All non-service variants were handled above
    Error::Response(format!("Unexpected DynamoDB error: {:?}", err))
}

/// Map CloudWatch SDK errors using typed `SdkError` variants.
pub fn map_cloudwatch_error<E, R>(err: SdkError<E, R>) -> Error
where
    E: aws_sdk_cloudwatch::error::ProvideErrorMetadata + std::fmt::Debug + std::fmt::Display,
    R: std::fmt::Debug,
{
    if let Some(mapped) = map_outer_sdk_error(&err, AwsService::CloudWatch) {
        return mapped;
    }

    if let Some(service_err) = err.as_service_error() {
        let meta = aws_sdk_cloudwatch::error::ProvideErrorMetadata::meta(service_err);
        let code = meta.code();
        let message = meta.message();
        let display = service_err.to_string();
        return map_cloudwatch_code(code, message, &display);
    }

    Error::Response(format!("Unexpected CloudWatch error: {:?}", err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_and_local_classes() {
        assert!(Error::NotFound("Table 'x' not found".into()).is_remote());
        assert!(Error::Throttled("slow down".into()).is_remote());
        assert!(Error::Connection("refused".into()).is_remote());
        assert!(
            Error::Service {
                code: "InternalServerError".into(),
                message: "oops".into()
            }
            .is_remote()
        );
        assert!(!Error::InvalidParameter("unknown key 'Foo'".into()).is_remote());
        assert!(!Error::Logic("no continuation".into()).is_remote());
    }

    #[test]
    fn common_codes_map_to_credentials_and_throttling() {
        let err = map_common_service_code(
            Some("UnrecognizedClientException"),
            None,
            AwsService::DynamoDb,
        );
        assert!(matches!(err, Some(Error::Credentials(_))));

        let err =
            map_common_service_code(Some("ThrottlingException"), None, AwsService::CloudWatch);
        match err {
            Some(Error::Throttled(msg)) => assert!(msg.contains("CloudWatch")),
            other => panic!("expected Throttled, got {:?}", other),
        }

        assert!(
            map_common_service_code(Some("SomethingElse"), None, AwsService::DynamoDb).is_none()
        );
        assert!(map_common_service_code(None, None, AwsService::DynamoDb).is_none());
    }

    #[test]
    fn dynamodb_codes_carry_the_table_name() {
        let err = map_dynamodb_code(
            Some("ResourceNotFoundException"),
            None,
            "display",
            Some("sessions"),
        );
        match err {
            Error::NotFound(msg) => assert!(msg.contains("sessions")),
            other => panic!("expected NotFound, got {:?}", other),
        }

        let err = map_dynamodb_code(Some("ConditionalCheckFailedException"), None, "display", None);
        assert!(matches!(err, Error::ConditionalCheckFailed));

        let err = map_dynamodb_code(Some("InternalServerError"), Some("boom"), "display", None);
        match err {
            Error::Service { code, message } => {
                assert_eq!(code, "InternalServerError");
                assert_eq!(message, "boom");
            }
            other => panic!("expected Service, got {:?}", other),
        }
    }

    #[test]
    fn cloudwatch_parameter_codes_map_to_validation() {
        let err = map_cloudwatch_code(Some("InvalidParameterValue"), Some("bad period"), "display");
        match err {
            Error::Validation(msg) => assert_eq!(msg, "bad period"),
            other => panic!("expected Validation, got {:?}", other),
        }
    }
}
