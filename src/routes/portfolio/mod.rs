mod handler;
mod model;

pub use handler::{
    create_item, delete_item, get_item, list_categories, list_items, portfolio_stats,
    toggle_featured, update_item,
};
pub use model::{CategoryList, PortfolioItem, PortfolioStats, PortfolioUpdate};
