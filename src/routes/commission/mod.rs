mod handler;
mod model;

pub use handler::{
    commission_stats, create_commission, delete_commission, get_commission, list_commissions,
    update_commission,
};
pub use model::{Commission, CommissionStats, CommissionUpdate, CreateCommissionRequest};
