use time_it_runner::prelude::{
    init, load_config, report, run, JsonFileReportCollector, ReportCollector,
    TableReportCollector, TimeItResult, TraceReportCollector,
};

fn main() -> TimeItResult<()> {
    let cli = init();

    println!("TimeIt v{}\n", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli.config)?;
    let summary = run(&config, cli.progress_mode())?;

    let collectors: Vec<Box<dyn ReportCollector>> = vec![
        Box::new(TableReportCollector::new()),
        Box::new(JsonFileReportCollector::new(
            config.json_output_path(cli.json_output.as_deref()),
        )),
        Box::new(TraceReportCollector::new(
            config.enable_telemetry,
            config.telemetry_run_spans,
        )),
    ];

    if !report(&summary, &collectors) {
        log::error!("Every scenario failed");
        std::process::exit(1);
    }

    Ok(())
}
