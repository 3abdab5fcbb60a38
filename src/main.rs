use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use vfm::console;
use vfm::image;
use vfm::{Image, Machine, MachineConfig, Step};

/// Run a dictionary image on the virtual Forth machine
#[derive(Parser, Debug)]
#[command(name = "vfm", version)]
#[command(about = "Run a dictionary image on the virtual Forth machine")]
struct Args {
  /// Memory image to start from (a snapshot written by `bye`)
  image: Option<PathBuf>,

  /// Size of memory in cells
  #[arg(long, default_value_t = vfm::memory::MEMORY_CELLS)]
  cells: usize,

  /// Directory `bye` writes its memory snapshot to
  #[arg(long, default_value = ".")]
  dump_dir: PathBuf,

  /// Do not write a memory snapshot on `bye`
  #[arg(long)]
  no_dump: bool,

  /// Print the machine state to stderr after every step
  #[arg(long)]
  trace: bool,

  /// Print a listing of the image and exit
  #[arg(long)]
  disassemble: bool,
}

fn init_logging() {
  fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
    .with_writer(std::io::stderr)
    .init();
}

fn main() {
  init_logging();
  let args = Args::parse();

  let cells = match &args.image {
    Some(path) => match image::load_file(path, args.cells) {
      Ok(cells) => cells,
      Err(e)    => {
        error!("Failed to load {}: {}", path.display(), e);
        process::exit(1);
      }
    },
    None => Vec::new(),
  };

  if args.disassemble {
    print!("{}", Image::from_cells(cells).disassemble());
    return;
  }

  let config = MachineConfig {
    memory_cells : args.cells,
    ..MachineConfig::default()
  };
  let mut machine = Machine::new(config, console::stdio());
  if let Err(e) = machine.load(&cells) {
    error!("{}", e);
    process::exit(1);
  }

  println!("\n vfm v{}", env!("CARGO_PKG_VERSION"));

  loop {
    let step = match machine.step() {
      Ok(step) => step,
      Err(e)   => {
        error!("{}", e);
        eprintln!("{}", machine);
        process::exit(1);
      }
    };
    if args.trace {
      eprintln!("{}", machine);
    }
    if step == Step::Halt {
      break;
    }
  }

  if !args.no_dump {
    match image::dump_file(machine.memory(), &args.dump_dir) {
      Ok(path) => {
        info!("wrote {}", path.display());
        println!("\n wrote {}", path.display());
      }
      Err(e) => {
        error!("Failed to write memory snapshot: {}", e);
        process::exit(1);
      }
    }
  }
}
