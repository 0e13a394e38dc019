//! 资源记录定义

pub mod ai_settings;
pub mod category;
pub mod order;
pub mod product;
pub mod settings;

pub use ai_settings::{AiSettings, AiSettingsDraft, AiSettingsPatch, FLAG_AI_CHAT, FLAG_AI_COMMENT};
pub use category::{Category, CategoryDraft, CategoryPatch};
pub use order::{Order, OrderDraft, OrderItem, OrderPatch, OrderStatus};
pub use product::{Availability, Product, ProductDraft, ProductPatch};
pub use settings::{SettingsDraft, SettingsPatch, StoreSettings, DEFAULT_LOW_STOCK_THRESHOLD};
