use std::fmt::Write as _;
use std::str::FromStr;

use backlit::{Backlight, BacklitError, brightness_percent, value_for_percent};
use log::{debug, warn};

const SLIDER_WIDTH: usize = 30;

/// What the user typed at the prompt.
#[derive(Debug, PartialEq)]
pub enum Command {
    Redraw,
    List,
    Select(String),
    Load,
    Set(u32),
    Percent(f64),
    Up,
    Down,
    Confirm,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(word) = words.next() else {
            return Ok(Command::Redraw);
        };
        let arg = words.next();

        let number = |arg: Option<&str>| -> Result<u32, String> {
            arg.ok_or_else(|| format!("'{word}' needs a value"))?
                .parse()
                .map_err(|_| format!("'{}' is not a brightness value", arg.unwrap_or_default()))
        };
        let percent = |arg: &str| -> Result<f64, String> {
            arg.trim_end_matches('%')
                .parse()
                .map_err(|_| format!("'{arg}' is not a percentage"))
        };

        match word {
            "l" | "list" | "devices" => Ok(Command::List),
            "s" | "select" => arg
                .map(|device| Command::Select(device.to_string()))
                .ok_or_else(|| "'select' needs a device name or number".to_string()),
            "r" | "load" => Ok(Command::Load),
            "set" => number(arg).map(Command::Set),
            "p" | "percent" => percent(arg.ok_or("'percent' needs a value")?).map(Command::Percent),
            "+" | "up" => Ok(Command::Up),
            "-" | "down" => Ok(Command::Down),
            "c" | "confirm" | "apply" => Ok(Command::Confirm),
            "h" | "help" | "?" => Ok(Command::Help),
            "q" | "quit" | "exit" => Ok(Command::Quit),
            word if word.ends_with('%') => percent(word).map(Command::Percent),
            word => number(Some(word))
                .map(Command::Set)
                .map_err(|_| format!("Unknown command '{word}', try 'help'")),
        }
    }
}

pub const HELP: &str = "\
  list            show devices
  select <dev|n>  switch device (name or number from 'list')
  load            reset the slider to the device's current brightness
  set <n> | <n>   move the slider to a raw value
  <p>%            move the slider to a percentage
  + / -           nudge the slider
  confirm         write the slider value to the device
  quit";

/// State of the brightness panel: which device is selected and where the
/// slider sits. Nothing is written until [`Panel::confirm`].
#[derive(Debug)]
pub struct Panel {
    devices: Vec<String>,
    selected: usize,
    max_brightness: u32,
    value: u32,
    step_percent: f64,
}

impl Panel {
    /// Build the panel over `devices`, starting on `initial` when it is one of
    /// them and on the first device otherwise.
    pub async fn new(
        backlight: &Backlight,
        devices: Vec<String>,
        initial: Option<&str>,
    ) -> Result<Self, BacklitError> {
        if devices.is_empty() {
            return Err(BacklitError::NoDevices);
        }
        let selected = match initial {
            Some(name) => devices.iter().position(|d| d == name).unwrap_or_else(|| {
                warn!("{name:?} is not a backlight device, using {:?}", devices[0]);
                0
            }),
            None => 0,
        };

        let mut panel = Panel {
            devices,
            selected,
            max_brightness: 1,
            value: 0,
            step_percent: backlight.config().step_percent,
        };
        panel.refresh_range(backlight).await;
        Ok(panel)
    }

    pub fn device(&self) -> &str {
        &self.devices[self.selected]
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn max_brightness(&self) -> u32 {
        self.max_brightness
    }

    /// Switch to `device`, given by name or 1-based position. Returns false
    /// when no such device was listed.
    pub async fn select(&mut self, backlight: &Backlight, device: &str) -> bool {
        let index = match device.parse::<usize>() {
            Ok(n) if (1..=self.devices.len()).contains(&n) => Some(n - 1),
            _ => self.devices.iter().position(|d| d == device),
        };
        let Some(index) = index else {
            return false;
        };
        self.selected = index;
        self.refresh_range(backlight).await;
        true
    }

    async fn refresh_range(&mut self, backlight: &Backlight) {
        let max = backlight.get_max_brightness(self.device()).await;
        if max.is_default() {
            warn!("max brightness of {} unknown, using {}", self.device(), max.value());
        }
        self.max_brightness = max.value();
        self.load(backlight).await;
    }

    /// Move the slider to the device's current brightness.
    pub async fn load(&mut self, backlight: &Backlight) {
        let current = backlight.get_current_brightness(self.device()).await;
        debug!("{} current {:?}", self.device(), current);
        self.set_value(current.value());
    }

    pub fn set_value(&mut self, value: u32) {
        self.value = value.min(self.max_brightness);
    }

    pub fn set_percent(&mut self, percent: f64) {
        self.set_value(value_for_percent(percent, self.max_brightness));
    }

    pub fn step_up(&mut self) {
        let step = self.step();
        self.set_value(self.value.saturating_add(step));
    }

    pub fn step_down(&mut self) {
        let step = self.step();
        self.set_value(self.value.saturating_sub(step));
    }

    fn step(&self) -> u32 {
        value_for_percent(self.step_percent, self.max_brightness).max(1)
    }

    /// Write the slider value to the selected device.
    pub async fn confirm(&self, backlight: &Backlight) -> Result<(), BacklitError> {
        backlight.set_brightness(self.device(), self.value).await
    }

    pub fn percent(&self) -> f64 {
        brightness_percent(self.value, self.max_brightness)
    }

    /// `(25%) - 60`
    pub fn value_label(&self) -> String {
        format!("({:.0}%) - {}", self.percent(), self.value)
    }

    pub fn render(&self) -> String {
        let filled = ((self.percent() / 100.0) * SLIDER_WIDTH as f64).round() as usize;
        let mut out = String::new();
        let _ = writeln!(out, "{} [0..{}]", self.device(), self.max_brightness);
        let _ = write!(
            out,
            "[{}{}] {}",
            "#".repeat(filled),
            "-".repeat(SLIDER_WIDTH - filled),
            self.value_label()
        );
        out
    }

    pub fn render_devices(&self) -> String {
        self.devices
            .iter()
            .enumerate()
            .map(|(i, device)| {
                let marker = if i == self.selected { '*' } else { ' ' };
                format!("{marker} {}. {device}", i + 1)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use backlit::{BacklitConfig, WriterKind};

    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    struct FakeSysfs(PathBuf);

    impl FakeSysfs {
        fn new(devices: &[(&str, &str, &str)]) -> Self {
            let root = std::env::temp_dir().join(format!(
                "backlit-panel-{}-{}",
                std::process::id(),
                COUNTER.fetch_add(1, Ordering::Relaxed)
            ));
            for (device, brightness, max) in devices {
                let dir = root.join(device);
                std::fs::create_dir_all(&dir).unwrap();
                std::fs::write(dir.join("brightness"), brightness).unwrap();
                std::fs::write(dir.join("max_brightness"), max).unwrap();
            }
            Self(root)
        }

        fn backlight(&self) -> Backlight {
            Backlight::new(BacklitConfig {
                root: self.0.clone(),
                writer: WriterKind::Elevated,
                elevation_command: vec!["env".into()],
                ..Default::default()
            })
        }

        fn brightness(&self, device: &str) -> String {
            std::fs::read_to_string(self.0.join(device).join("brightness")).unwrap()
        }
    }

    impl Drop for FakeSysfs {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    fn names(devices: &[&str]) -> Vec<String> {
        devices.iter().map(|d| d.to_string()).collect()
    }

    #[test]
    fn parses_commands() {
        assert_eq!("".parse(), Ok(Command::Redraw));
        assert_eq!("set 120".parse(), Ok(Command::Set(120)));
        assert_eq!("120".parse(), Ok(Command::Set(120)));
        assert_eq!("25%".parse(), Ok(Command::Percent(25.0)));
        assert_eq!("percent 40".parse(), Ok(Command::Percent(40.0)));
        assert_eq!(
            "select acpi_video0".parse(),
            Ok(Command::Select("acpi_video0".into()))
        );
        assert_eq!("+".parse(), Ok(Command::Up));
        assert_eq!("confirm".parse(), Ok(Command::Confirm));
        assert_eq!("q".parse(), Ok(Command::Quit));
        assert!("set".parse::<Command>().is_err());
        assert!("set -3".parse::<Command>().is_err());
        assert!("brighter".parse::<Command>().is_err());
    }

    #[tokio::test]
    async fn empty_device_list() {
        let backlight = Backlight::default();
        assert!(matches!(
            Panel::new(&backlight, Vec::new(), None).await,
            Err(BacklitError::NoDevices)
        ));
    }

    #[tokio::test]
    async fn starts_on_first_device() {
        let sysfs = FakeSysfs::new(&[("intel_backlight", "60", "240")]);
        let backlight = sysfs.backlight();
        let panel = Panel::new(&backlight, names(&["intel_backlight"]), None)
            .await
            .unwrap();
        assert_eq!(panel.device(), "intel_backlight");
        assert_eq!(panel.max_brightness(), 240);
        assert_eq!(panel.value(), 60);
        assert_eq!(panel.value_label(), "(25%) - 60");
    }

    #[tokio::test]
    async fn initial_device_and_selection() {
        let sysfs = FakeSysfs::new(&[
            ("intel_backlight", "60", "240"),
            ("acpi_video0", "3", "10"),
        ]);
        let backlight = sysfs.backlight();
        let devices = names(&["intel_backlight", "acpi_video0"]);

        let mut panel = Panel::new(&backlight, devices.clone(), Some("acpi_video0"))
            .await
            .unwrap();
        assert_eq!((panel.device(), panel.value()), ("acpi_video0", 3));

        assert!(panel.select(&backlight, "1").await);
        assert_eq!(panel.device(), "intel_backlight");
        assert_eq!(panel.max_brightness(), 240);
        assert!(!panel.select(&backlight, "kbd_backlight").await);
        assert!(!panel.select(&backlight, "3").await);

        let panel = Panel::new(&backlight, devices, Some("kbd_backlight"))
            .await
            .unwrap();
        assert_eq!(panel.device(), "intel_backlight");
    }

    #[tokio::test]
    async fn slider_is_clamped() {
        let sysfs = FakeSysfs::new(&[("intel_backlight", "60", "240")]);
        let backlight = sysfs.backlight();
        let mut panel = Panel::new(&backlight, names(&["intel_backlight"]), None)
            .await
            .unwrap();

        panel.set_value(1000);
        assert_eq!(panel.value(), 240);
        panel.step_up();
        assert_eq!(panel.value(), 240);
        panel.set_percent(50.0);
        assert_eq!(panel.value(), 120);
        panel.step_down();
        assert_eq!(panel.value(), 108);
        panel.set_value(0);
        panel.step_down();
        assert_eq!(panel.value(), 0);
    }

    #[tokio::test]
    async fn confirm_writes_and_load_reads_back() {
        let sysfs = FakeSysfs::new(&[("intel_backlight", "60", "240")]);
        let backlight = sysfs.backlight();
        let mut panel = Panel::new(&backlight, names(&["intel_backlight"]), None)
            .await
            .unwrap();

        panel.set_value(200);
        panel.confirm(&backlight).await.unwrap();
        assert_eq!(sysfs.brightness("intel_backlight"), "200");

        panel.set_value(10);
        panel.load(&backlight).await;
        assert_eq!(panel.value(), 200);
    }

    #[tokio::test]
    async fn unknown_max_uses_fallback_range() {
        let sysfs = FakeSysfs::new(&[("intel_backlight", "60", "abc")]);
        let backlight = sysfs.backlight();
        let panel = Panel::new(&backlight, names(&["intel_backlight"]), None)
            .await
            .unwrap();
        assert_eq!(panel.max_brightness(), 255);
        assert_eq!(panel.value(), 60);
    }

    #[tokio::test]
    async fn renders_slider() {
        let sysfs = FakeSysfs::new(&[("intel_backlight", "120", "240")]);
        let backlight = sysfs.backlight();
        let panel = Panel::new(&backlight, names(&["intel_backlight"]), None)
            .await
            .unwrap();
        assert_eq!(
            panel.render(),
            format!(
                "intel_backlight [0..240]\n[{}{}] (50%) - 120",
                "#".repeat(15),
                "-".repeat(15)
            )
        );
        assert_eq!(panel.render_devices(), "* 1. intel_backlight");
    }
}
