//! User-facing text shown when no VR API is available

const COMBINING_LOW_LINE: char = '\u{0332}';

/// Underline `text` with combining low lines, one after every character
pub fn underline(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 3);
    for c in text.chars() {
        out.push(c);
        out.push(COMBINING_LOW_LINE);
    }
    out
}

/// Explanation shown when neither the XR nor the legacy VR API is present
pub fn no_vr_message() -> String {
    format!(
        "{}\n\n\
         The best support for VR is in a current version of Mozilla Firefox.\n\n\
         If you want to use the {} in Google Chrome,\n\
         go to the address bar and type: {}.\n\
         Then in the {} for the flags, type {}.\n\
         Enable the flags regarding WebVR and the runtime that you usually use for virtual reality.\n\
         Click the {} button and try again.",
        underline("No VR support found."),
        underline("experimental VR mode"),
        underline("chrome://flags"),
        underline("search bar"),
        underline("vr"),
        underline("RELAUNCH NOW"),
    )
}
