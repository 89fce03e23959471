pub mod chapter_editor;
pub mod confirm_dialog;
pub mod draw_modal;
pub mod progress_bar;
pub mod subject_card;
