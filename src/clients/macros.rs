/// Generates an async client method that sends a request variant with a
/// oneshot responder and waits for the reply, with automatic tracing.
macro_rules! client_method {
    ($client:ty => fn $method:ident($($param:ident: $param_type:ty),*) -> $return_type:ty as $request:ident::$variant:ident) => {
        impl $client {
            #[tracing::instrument(skip(self))]
            pub async fn $method(&self, $($param: $param_type),*) -> Result<$return_type, $crate::app_system::BoardError> {
                tracing::debug!("Sending request");
                let (respond_to, response) = tokio::sync::oneshot::channel();
                self.sender.send($request::$variant {
                    $($param,)*
                    respond_to,
                }).await.map_err(|_| $crate::app_system::BoardError::Closed)?;

                response.await.map_err(|_| $crate::app_system::BoardError::Dropped)?
            }
        }
    };
}
