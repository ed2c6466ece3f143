//! Cross-module scenarios exercising blocks, entities and the world together

mod frame_scenarios;
mod lifecycle_scenarios;
