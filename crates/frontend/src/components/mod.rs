pub mod bottom_sheet;
pub mod map_view;
pub mod route_panel;
pub mod status_message;
