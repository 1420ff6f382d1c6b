mod session;
mod view;

pub use session::Session;

use std::path::PathBuf;

use crate::map::viewport::Vec2;

pub const HELP: &str = "\
Komutlar:
  <soru>                 soruyu sor
  :open N                N numaralı kaynağı okuyucuda aç
  :close                 okuyucuyu kapat
  :zoom in | :zoom out   haritayı yakınlaştır / uzaklaştır
  :reset                 haritayı sıfırla
  :drag X1 Y1 X2 Y2      haritayı A noktasından B noktasına sürükle
  :map DOSYA             haritayı SVG olarak kaydet
  :help                  bu yardım
  :quit                  çıkış";

/// One line of user input.
#[derive(Debug, PartialEq)]
pub enum Command {
    /// Plain text is a question; blank lines come through as empty ones.
    Ask(String),
    /// 1-based citation index.
    Open(usize),
    Close,
    ZoomIn,
    ZoomOut,
    Reset,
    Drag { from: Vec2, to: Vec2 },
    ExportMap(PathBuf),
    Help,
    Quit,
    Invalid(String),
}

impl Command {
    pub fn parse(input: &str) -> Self {
        let line = input.trim();
        let Some(rest) = line.strip_prefix(':') else {
            return Command::Ask(line.to_string());
        };

        let mut words = rest.split_whitespace();
        let name = words.next().unwrap_or("");
        let args: Vec<&str> = words.collect();

        match (name, args.as_slice()) {
            ("open", [n]) => match n.parse::<usize>() {
                Ok(i) if i > 0 => Command::Open(i),
                _ => Command::Invalid(format!("Geçersiz kaynak numarası: {}", n)),
            },
            ("close", []) => Command::Close,
            ("zoom", ["in"]) | ("zoom", ["+"]) => Command::ZoomIn,
            ("zoom", ["out"]) | ("zoom", ["-"]) => Command::ZoomOut,
            ("reset", []) => Command::Reset,
            ("drag", [_, _, _, _]) => match parse_coords(&args) {
                Some([ax, ay, bx, by]) => Command::Drag {
                    from: Vec2::new(ax, ay),
                    to: Vec2::new(bx, by),
                },
                None => Command::Invalid("Koordinatlar sayı olmalı".to_string()),
            },
            ("map", [_, ..]) => Command::ExportMap(PathBuf::from(args.join(" "))),
            ("help", _) | ("h", _) => Command::Help,
            ("quit", _) | ("q", _) | ("exit", _) => Command::Quit,
            _ => Command::Invalid(format!("Bilinmeyen komut: {}", line)),
        }
    }
}

fn parse_coords(raw: &[&str]) -> Option<[f64; 4]> {
    let mut out = [0.0; 4];
    for (slot, value) in out.iter_mut().zip(raw.iter()) {
        let v: f64 = value.parse().ok()?;
        if !v.is_finite() {
            return None;
        }
        *slot = v;
    }
    Some(out)
}
