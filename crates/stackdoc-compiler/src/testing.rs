//! In-memory [`StoreClient`] for tests.

use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::error::RemoteError;
use crate::sync::StoreClient;

type Handler = dyn Fn(&str, &str, &Value) -> Result<Value, RemoteError> + Send + Sync;

#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub service: String,
    pub operation: String,
    pub params: Value,
}

/// Records every request and answers it with a handler.
pub(crate) struct MockStore {
    calls: Mutex<Vec<RecordedCall>>,
    handler: Box<Handler>,
}

impl MockStore {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&str, &str, &Value) -> Result<Value, RemoteError> + Send + Sync + 'static,
    {
        Self {
            calls: Mutex::new(Vec::new()),
            handler: Box::new(handler),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn calls_to(&self, operation: &str) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.operation == operation)
            .cloned()
            .collect()
    }

    pub fn operations(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .map(|call| call.operation.clone())
            .collect()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.calls_to(operation).len()
    }
}

impl StoreClient for MockStore {
    async fn request(
        &self,
        service: &str,
        operation: &str,
        params: Value,
    ) -> Result<Value, RemoteError> {
        self.calls.lock().push(RecordedCall {
            service: service.to_string(),
            operation: operation.to_string(),
            params: params.clone(),
        });
        tokio::task::yield_now().await;
        (self.handler)(service, operation, &params)
    }
}

/// A `describeStacks` response exposing `api_id` as the API id output.
pub(crate) fn stack_with_api_id(api_id: &str) -> Value {
    json!({
        "Stacks": [{
            "StackName": "pets-dev",
            "Outputs": [
                {"OutputKey": "ServiceEndpoint", "OutputValue": "https://example.com/dev"},
                {"OutputKey": "AwsDocApiId", "OutputValue": api_id}
            ]
        }]
    })
}
