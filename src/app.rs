use formscroll::config::FormConfig;
use formscroll::event::MouseTracker;
use formscroll::widgets::{Checkbox, DropDown, FormItem, InputField, ScrollableForm, TextArea};
use itertools::Itertools;
use ratatui::layout::Alignment;
use ratatui::style::{Style, Stylize};
use ratatui::widgets::{Block, BorderType, Padding};
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::ui::Palette;

const PASSWORD_LABEL: &str = "Password";
const TITLES: [&str; 5] = ["Mr.", "Ms.", "Mrs.", "Dr.", "Prof."];

/// What the form callbacks ask the application to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormAction {
    Save,
    Quit,
    Cancel,
    TitleSelected(String),
}

pub struct App {
    pub running: bool,
    pub form: ScrollableForm,
    /// Last message shown below the form.
    pub status: String,
    pub mouse: MouseTracker,
    pub debugger_state: tui_logger::TuiWidgetState,
    actions: mpsc::UnboundedReceiver<FormAction>,
}

fn send(sender: &mpsc::UnboundedSender<FormAction>, action: FormAction) {
    if let Err(err) = sender.send(action) {
        error!("Form action channel closed: {err}");
    }
}

impl App {
    pub fn new(config: &FormConfig) -> Self {
        let (sender, actions) = mpsc::unbounded_channel();
        let mut form = ScrollableForm::from_config(config);

        let title_sender = sender.clone();
        let title = DropDown::new(
            "Title",
            TITLES.iter().map(|title| title.to_string()).collect(),
            Some(0),
        )
        .on_selected(move |option, _| {
            send(&title_sender, FormAction::TitleSelected(option.to_string()))
        });

        let save_sender = sender.clone();
        let quit_sender = sender.clone();
        let cancel_sender = sender;
        form.add_input_field("First name", "", 20)
            .add_input_field("Last name", "", 20)
            .add_text_area("Address", "", 40, 3, 0)
            .add_form_item(title.boxed())
            .add_text_view(
                "Notes",
                "This is just a demo.\nYou can enter [::b]whatever[::-] you wish.",
                40,
                2,
                true,
                false,
            )
            .add_checkbox("Age 18+", false)
            .add_password_field(PASSWORD_LABEL, "", 10, Some('*'))
            .add_button("Save", move || send(&save_sender, FormAction::Save))
            .add_button("Quit", move || send(&quit_sender, FormAction::Quit))
            .set_cancel_fn(move || send(&cancel_sender, FormAction::Cancel))
            .set_block(
                Block::bordered()
                    .border_type(BorderType::Rounded)
                    .border_style(Style::new().fg(Palette::PURPLE))
                    .title(" Enter some data ".fg(Palette::PINK).bold())
                    .title_alignment(Alignment::Left)
                    .padding(Padding::horizontal(1)),
            );
        form.set_focus(0);

        Self {
            running: true,
            form,
            status: String::from("Tab to move, Enter to press, Esc to leave"),
            mouse: MouseTracker::new(),
            debugger_state: tui_logger::TuiWidgetState::new(),
            actions,
        }
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Applies everything the form callbacks sent since the last call.
    pub fn process_actions(&mut self) {
        while let Ok(action) = self.actions.try_recv() {
            debug!(?action, "form action");
            match action {
                FormAction::Save => self.status = self.summary(),
                FormAction::Quit | FormAction::Cancel => self.quit(),
                FormAction::TitleSelected(title) => self.status = format!("Title: {title}"),
            }
        }
    }

    /// The current values, password excluded.
    fn summary(&self) -> String {
        let values = (0..self.form.form_item_count())
            .filter_map(|index| self.form.form_item(index))
            .filter(|item| item.label() != PASSWORD_LABEL)
            .filter_map(|item| field_value(item).map(|value| format!("{}: {value}", item.label())))
            .join(", ");
        format!("Saved {values}")
    }
}

fn field_value(item: &dyn FormItem) -> Option<String> {
    let any = item.as_any();
    if let Some(field) = any.downcast_ref::<InputField>() {
        return Some(field.value().to_string());
    }
    if let Some(area) = any.downcast_ref::<TextArea>() {
        return Some(area.text().replace('\n', " "));
    }
    if let Some(dropdown) = any.downcast_ref::<DropDown>() {
        return dropdown.current_option().map(|(_, option)| option.to_string());
    }
    any.downcast_ref::<Checkbox>()
        .map(|checkbox| (if checkbox.is_checked() { "yes" } else { "no" }).to_string())
}
