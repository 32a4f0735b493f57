// Services layer for business logic
// Handlers stay thin; services own validation, flow access and response shaping

pub mod tool;

pub use tool::ToolService;
