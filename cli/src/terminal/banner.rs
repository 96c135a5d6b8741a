use colored::*;

use crate::terminal::print;

const BANNER_0: &str = r#"
  ██╗ ██████╗ ███╗   ██╗██╗ ██████╗███████╗██╗   ██╗██████╗
  ██║██╔═══██╗████╗  ██║██║██╔════╝██╔════╝██║   ██║██╔══██╗
  ██║██║   ██║██╔██╗ ██║██║██║     ███████╗██║   ██║██████╔╝
  ██║██║   ██║██║╚██╗██║██║██║     ╚════██║██║   ██║██╔══██╗
  ██║╚██████╔╝██║ ╚████║██║╚██████╗███████║╚██████╔╝██████╔╝
  ╚═╝ ╚═════╝ ╚═╝  ╚═══╝╚═╝ ╚═════╝╚══════╝ ╚═════╝ ╚═════╝
"#;

const BANNER_1: &str = r#"
          _             _                _
         (_) ___  _ __ (_) ___ ___ _   _| |__
         | |/ _ \| '_ \| |/ __/ __| | | | '_ \
         | | (_) | | | | | (__\__ \ |_| | |_) |
         |_|\___/|_| |_|_|\___|___/\__,_|_.__/
"#;

pub const TAGLINE: &str = "Subdomain Enumeration Script";

pub fn print() {
    let art: ColoredString = match rand::random_range(0..=1u8) {
        0 => BANNER_0.bright_blue().bold(),
        _ => BANNER_1.truecolor(80, 170, 255),
    };
    print::print(&art.to_string());
    print::centerln(&TAGLINE.bright_cyan().bold().to_string());
}
