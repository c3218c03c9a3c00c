use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "fieldview-studio")]
#[command(about = "Interactive vector-field surface viewer", long_about = None)]
pub struct Cli {
    /// Grid points along x
    #[arg(long, default_value_t = 30)]
    pub nx: u32,

    /// Grid points along y
    #[arg(long, default_value_t = 30)]
    pub ny: u32,

    /// Grid points along z (1 gives a flat sheet)
    #[arg(long, default_value_t = 1)]
    pub nz: u32,

    /// Initial colormap: hsv, blue-white-red, blue-green-red, blue-red, white, black
    #[arg(long, default_value = "hsv")]
    pub colormap: String,

    /// Log filter in env_logger syntax (falls back to RUST_LOG)
    #[arg(long)]
    pub log: Option<String>,

    #[arg(long, default_value_t = 1024.0)]
    pub width: f64,

    #[arg(long, default_value_t = 768.0)]
    pub height: f64,
}
