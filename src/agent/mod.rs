pub mod context;
pub mod llm;
pub mod router;
pub mod session;
pub mod templates;
pub mod weather;

pub use context::Context;
pub use llm::{CompletionProvider, LlmClient};
pub use router::{MessageRouter, Reply, Route};
pub use session::SessionStore;
pub use templates::{Category, TemplateSelector};
pub use weather::{WeatherClient, WeatherProvider};
