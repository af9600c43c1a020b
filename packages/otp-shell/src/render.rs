//! Screen rendering for the sign-in shell.
//!
//! Pure: turns the flow's current state into styled lines. The app clears
//! and redraws on every change.

use console::style;
use otp_flow::{AuthFlow, FlowState, Key, KeypadInput, Notice, OtpEntry, PhoneEntry};

const CURSOR: &str = "▏";

/// Build every line of the current screen.
pub fn screen(flow: &AuthFlow, notices: &[Notice]) -> Vec<String> {
    let mut lines = vec![
        style("Sign in").bold().cyan().to_string(),
        String::new(),
    ];

    match flow.state() {
        FlowState::PhoneEntry(entry) => phone_entry(&mut lines, flow, entry),
        FlowState::Dispatching { .. } => {
            lines.push(phone_field(flow, false));
            lines.push(String::new());
            lines.push(busy_line("Sending code"));
        }
        FlowState::OtpEntry(entry) => otp_entry(&mut lines, flow, entry),
        FlowState::Verifying { .. } => {
            lines.push(phone_field(flow, false));
            lines.push(String::new());
            lines.push(busy_line("Verifying code"));
        }
        FlowState::Authenticated { .. } => {
            lines.push(phone_field(flow, false));
            lines.push(style("Verified").green().to_string());
        }
    }

    if !notices.is_empty() {
        lines.push(String::new());
        lines.extend(notices.iter().map(notice_line));
    }
    lines
}

fn phone_entry(lines: &mut Vec<String>, flow: &AuthFlow, entry: &PhoneEntry) {
    lines.push(style("Phone number").dim().to_string());
    lines.push(phone_field(flow, entry.shows_cursor()));
    lines.push(String::new());

    let checkbox = if entry.terms_accepted { "[x]" } else { "[ ]" };
    lines.push(format!("{} I accept the Terms and Conditions", checkbox));
    lines.push(String::new());
    lines.push(button("Send OTP", entry.can_send()));

    if entry.keypad_visible {
        lines.push(String::new());
        lines.extend(keypad(flow.keypad()));
    }

    lines.push(String::new());
    lines.push(hint(if entry.keypad_visible {
        "0-9 type · ⌫ delete · k hide keypad · t terms · enter send · q quit"
    } else {
        "k show keypad · t terms · enter send · q quit"
    }));
}

fn otp_entry(lines: &mut Vec<String>, flow: &AuthFlow, entry: &OtpEntry) {
    lines.push(format!(
        "Enter the code sent to {}",
        style(entry.phone_number.display_with_prefix(flow.country_prefix())).bold()
    ));
    lines.push(String::new());
    lines.push(otp_boxes(entry));
    lines.push(String::new());
    lines.push(button("Verify", entry.can_verify() && !entry.resend_in_flight));
    if entry.resend_in_flight {
        lines.push(busy_line("Resending code"));
    }
    lines.push(String::new());
    lines.extend(keypad(flow.keypad()));
    lines.push(String::new());
    lines.push(hint(
        "0-9 type · ⌫ delete · enter verify · r resend · e edit number · q quit",
    ));
}

fn phone_field(flow: &AuthFlow, cursor: bool) -> String {
    let digits = flow.formatted_phone();
    format!(
        "{} │ {}{}",
        style(flow.country_prefix()).bold(),
        digits,
        if cursor { CURSOR } else { "" }
    )
}

fn otp_boxes(entry: &OtpEntry) -> String {
    entry
        .candidate
        .slots()
        .map(|slot| match slot {
            Some(d) => format!("[{}]", style(d).bold()),
            None => "[ ]".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn keypad(input: KeypadInput) -> Vec<String> {
    input
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .map(|key| key_cell(*key, input.is_disabled()))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

fn key_cell(key: Key, disabled: bool) -> String {
    let text = match key {
        Key::Blank => " ".repeat(9),
        Key::Backspace => format!("{:^9}", "⌫"),
        Key::Digit(_) => format!("{:^3}{:<6}", key.label(), key.letters()),
    };
    if disabled || key.is_blank() {
        style(text).dim().to_string()
    } else {
        style(text).reverse().to_string()
    }
}

fn button(label: &str, enabled: bool) -> String {
    let text = format!("[ {} ]", label);
    if enabled {
        style(text).green().bold().to_string()
    } else {
        style(text).dim().to_string()
    }
}

fn busy_line(what: &str) -> String {
    style(format!("⏳ {}…", what)).yellow().to_string()
}

fn hint(text: &str) -> String {
    style(text).dim().to_string()
}

fn notice_line(notice: &Notice) -> String {
    let title = if notice.is_error() {
        style(notice.title).red().bold()
    } else {
        style(notice.title).green().bold()
    };
    format!("{}: {}", title, notice.message)
}
