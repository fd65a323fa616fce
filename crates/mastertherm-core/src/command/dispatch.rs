use std::sync::Arc;

use tracing::{debug, warn};

use mastertherm_api::WriteRequest;

use crate::codec;
use crate::error::CoreError;
use crate::model::{PointId, PointLayout, PointValue, PointWrite};
use crate::session::SessionManager;

/// Turns typed point writes into vendor write requests.
///
/// Writes are fire-and-verify-later: a success does not touch the snapshot
/// cache, the next poll shows the new state.
#[derive(Clone)]
pub struct Dispatcher {
    session: Arc<SessionManager>,
    layout: PointLayout,
}

impl Dispatcher {
    pub fn new(session: Arc<SessionManager>, layout: PointLayout) -> Self {
        Self { session, layout }
    }

    /// Write one point.
    pub async fn write(
        &self,
        device_id: &str,
        point: PointId,
        value: PointValue,
    ) -> Result<(), CoreError> {
        let fragment = codec::encode(point, value).map_err(|e| CoreError::from_codec(device_id, e))?;

        let client = self.session.client().clone();
        let module_id = device_id.to_owned();
        let config_file = self.layout.config_file.clone();

        let result = self
            .session
            .call(move |token, message_id| {
                let client = client.clone();
                let module_id = module_id.clone();
                let config_file = config_file.clone();
                let fragment = fragment.clone();
                async move {
                    let request = WriteRequest {
                        module_id: &module_id,
                        config_file: &config_file,
                        variable_id: &fragment.variable_id,
                        variable_value: &fragment.variable_value,
                    };
                    client.write_point(&token, message_id, &request).await
                }
            })
            .await;

        match result {
            Ok(_) => {
                debug!(device_id, %point, %value, "point written");
                Ok(())
            }
            Err(e) => {
                warn!(device_id, %point, error = %e, "point write failed");
                Err(e)
            }
        }
    }

    /// Write several points in order. The service has no atomic
    /// multi-point write, so a failure leaves earlier writes applied.
    pub async fn write_all(&self, device_id: &str, writes: &[PointWrite]) -> Result<(), CoreError> {
        for write in writes {
            self.write(device_id, write.point, write.value).await?;
        }
        Ok(())
    }
}
