pub mod button;
pub mod checkbox;
pub mod dropdown;
pub mod form_item;
pub mod image;
pub mod input_field;
pub mod layout;
pub mod non_focusable_button;
pub mod scrollable_form;
pub mod text_area;
pub mod text_view;

pub use button::Button;
pub use checkbox::Checkbox;
pub use dropdown::DropDown;
pub use form_item::{FormAttributes, FormItem, KeyOutcome, MouseOutcome};
pub use image::Image;
pub use input_field::InputField;
pub use non_focusable_button::NonFocusableButton;
pub use scrollable_form::{ScrollButton, ScrollableForm};
pub use text_area::TextArea;
pub use text_view::TextView;
