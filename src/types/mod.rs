mod chat;
mod openai;
mod weather;

pub use chat::{ChatRequest, ChatResponse, Role, Turn};
pub use openai::{ChatCompletionRequest, ChatCompletionResponse, Message};
pub use weather::{OpenWeatherResponse, WeatherReport};
