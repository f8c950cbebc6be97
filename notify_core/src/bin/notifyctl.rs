// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words notifyctl SIGCHLD

//! Exercise the notification core from the command line.
//!
//! ```text
//! notifyctl topics --children 3
//! notifyctl pool --jobs 64 --max-threads 4
//! notifyctl --log-level debug --log-file /tmp/notify.log fds --timeout-ms 100
//! notifyctl debounce --requests 10
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use miette::IntoDiagnostic;
use shell_notify::{Debounce, DisplayPreference, FdMonitor, FdMonitorItem,
                   ItemWakeReason, MainThreadQueue, ThreadPool, Topic, TopicChecker,
                   TopicMonitor, TracingConfig, WriterConfig, install_signal_handlers,
                   io_thread_pool, threads};
use std::{process::{Child, Command},
          sync::{Arc, mpsc,
                 atomic::{AtomicUsize, Ordering}},
          time::Duration};
use tracing_core::LevelFilter;

#[derive(Debug, Parser)]
#[command(bin_name = "notifyctl")]
#[command(about = "Drive the shell notification core by hand", long_about = None)]
#[command(version)]
#[command(next_line_help = true)]
#[command(arg_required_else_help(true))]
pub struct CLIArg {
    #[command(subcommand)]
    pub command: CLICommand,

    #[command(flatten)]
    pub global_options: GlobalOption,
}

#[derive(Debug, Args)]
pub struct GlobalOption {
    #[arg(
        global = true,
        long,
        value_enum,
        default_value_t = LogLevel::Warn,
        help = "Log to stderr at this level. `off` disables display logging."
    )]
    pub log_level: LogLevel,

    #[arg(global = true, long, help = "Also log to this file.")]
    pub log_file: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(it: LogLevel) -> Self {
        match it {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum CLICommand {
    /// Spawn short-lived children and wait for each SIGCHLD through the topic monitor.
    Topics {
        #[arg(long, default_value_t = 3)]
        children: usize,
    },
    /// Flood a thread pool with sleeping jobs and report how many threads it used.
    Pool {
        #[arg(long, default_value_t = 64)]
        jobs: usize,
        #[arg(long, default_value_t = 4)]
        max_threads: usize,
    },
    /// Watch a pipe with the fd monitor: one readable wakeup, then one timeout.
    Fds {
        #[arg(long, default_value_t = 100)]
        timeout_ms: u64,
    },
    /// Fire a burst of debounced requests and report which ones actually ran.
    Debounce {
        #[arg(long, default_value_t = 10)]
        requests: usize,
    },
}

impl GlobalOption {
    fn tracing_config(&self) -> TracingConfig {
        let display =
            (self.log_level != LogLevel::Off).then_some(DisplayPreference::Stderr);
        TracingConfig {
            writer_config: WriterConfig::from_parts(display, self.log_file.clone()),
            level_filter: match self.log_level {
                // File-only logging still needs a level.
                LogLevel::Off => LevelFilter::DEBUG,
                other => other.into(),
            },
        }
    }
}

fn main() -> miette::Result<()> {
    let cli_arg = CLIArg::parse();

    threads::init();
    cli_arg.global_options.tracing_config().install_global()?;
    // % is Display, ? is Debug.
    tracing::debug!(message = "Start notifyctl", cli_arg = ?cli_arg);

    match cli_arg.command {
        CLICommand::Topics { children } => run_topics(children),
        CLICommand::Pool { jobs, max_threads } => {
            run_pool(jobs, max_threads);
            Ok(())
        }
        CLICommand::Fds { timeout_ms } => run_fds(Duration::from_millis(timeout_ms)),
        CLICommand::Debounce { requests } => run_debounce(requests),
    }
}

fn run_topics(children: usize) -> miette::Result<()> {
    TopicMonitor::initialize_principal()?;
    install_signal_handlers()?;
    let mut sigchld = TopicChecker::for_principal(Topic::SigChld)?;

    let mut running: Vec<Child> = (0..children)
        .map(|_| Command::new("true").spawn())
        .collect::<Result<_, _>>()
        .into_diagnostic()?;

    let mut wakeups = 0_usize;
    loop {
        let mut still_running = Vec::with_capacity(running.len());
        for mut child in running {
            if child.try_wait().into_diagnostic()?.is_none() {
                still_running.push(child);
            }
        }
        running = still_running;
        if running.is_empty() {
            break;
        }
        sigchld.wait();
        wakeups += 1;
    }

    println!(
        "reaped {children} children after {wakeups} SIGCHLD wakeups (generation {})",
        sigchld.generation()
    );
    Ok(())
}

fn run_pool(jobs: usize, max_threads: usize) {
    let pool = ThreadPool::new(0, max_threads);
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let (done_tx, done_rx) = mpsc::channel();

    for _ in 0..jobs {
        let running = Arc::clone(&running);
        let peak = Arc::clone(&peak);
        let done_tx = done_tx.clone();
        pool.perform(
            move || {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(10));
                running.fetch_sub(1, Ordering::SeqCst);
                let _unused = done_tx.send(());
            },
            false,
        );
    }
    drop(done_tx);

    let finished = done_rx.iter().count();
    println!(
        "{finished} jobs finished, peak concurrency {} (max threads {max_threads})",
        peak.load(Ordering::SeqCst)
    );
}

fn run_fds(timeout: Duration) -> miette::Result<()> {
    let monitor = FdMonitor::new()?;
    let (read_end, write_end) = rustix::pipe::pipe().into_diagnostic()?;
    let (reason_tx, reason_rx) = mpsc::channel();

    let item = FdMonitorItem::new(read_end, Some(timeout), move |fd, reason| {
        if reason == ItemWakeReason::Readable
            && let Some(borrowed) = fd.as_fd()
        {
            let mut buf = [0_u8; 16];
            let _unused = rustix::io::read(borrowed, &mut buf[..]);
        }
        if reason == ItemWakeReason::TimedOut {
            fd.close();
        }
        let _unused = reason_tx.send(reason);
    });
    let item_id = monitor.add(item)?;

    rustix::io::write(&write_end, b"x").into_diagnostic()?;

    let limit = timeout * 4 + Duration::from_secs(1);
    for _ in 0..2 {
        match reason_rx.recv_timeout(limit) {
            Ok(reason) => println!("item {} woke: {reason}", item_id.0),
            Err(_) => miette::bail!("fd monitor callback did not run within {limit:?}"),
        }
    }
    Ok(())
}

fn run_debounce(requests: usize) -> miette::Result<()> {
    let debounce = Debounce::default();
    let queue: MainThreadQueue<Vec<usize>> = MainThreadQueue::new()?;

    for idx in 0..requests {
        debounce.perform_with_completion(
            &queue,
            move || {
                std::thread::sleep(Duration::from_millis(20));
                idx
            },
            |ran: &mut Vec<usize>, idx| ran.push(idx),
        );
    }

    let mut ran = vec![];
    queue.drain_all(io_thread_pool(), &mut ran);
    println!("{requests} requests, {} ran: {ran:?}", ran.len());
    Ok(())
}
