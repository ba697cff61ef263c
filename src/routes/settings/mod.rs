mod handler;
mod model;

pub use handler::{
    create_setting, delete_setting, get_commissions_status, get_setting, initialize_settings,
    list_settings, update_commissions_status, update_setting, upload_background_image,
    upload_profile_image,
};
pub use model::{
    BACKGROUND_IMAGE_KEY, COMMISSIONS_OPEN_KEY, CommissionsStatus, PROFILE_IMAGE_KEY, SiteSetting,
};
