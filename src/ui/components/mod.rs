pub mod menu;
pub mod quiz_area;
pub mod results_panel;
pub mod timer_bar;
