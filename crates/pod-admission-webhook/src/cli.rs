use clap::builder::PossibleValue;
use clap::{crate_authors, crate_description, crate_name, crate_version, Arg, ArgAction, Command};

pub fn build_cli() -> Command {
    let mut args = vec![
        Arg::new("log-level")
            .long("log-level")
            .value_name("LOG_LEVEL")
            .env("POD_ADMISSION_WEBHOOK_LOG_LEVEL")
            .default_value("info")
            .value_parser([
                PossibleValue::new("trace"),
                PossibleValue::new("debug"),
                PossibleValue::new("info"),
                PossibleValue::new("warn"),
                PossibleValue::new("error"),
            ])
            .help("Log level"),
        Arg::new("log-fmt")
            .long("log-fmt")
            .value_name("LOG_FMT")
            .env("POD_ADMISSION_WEBHOOK_LOG_FMT")
            .default_value("text")
            .value_parser([
                PossibleValue::new("text"),
                PossibleValue::new("json"),
                PossibleValue::new("otlp"),
            ])
            .help("Log output format"),
        Arg::new("log-no-color")
            .long("log-no-color")
            .env("NO_COLOR")
            .action(ArgAction::SetTrue)
            .help("Disable colored output for logs"),
        Arg::new("address")
            .long("addr")
            .value_name("BIND_ADDRESS")
            .default_value("0.0.0.0")
            .env("POD_ADMISSION_WEBHOOK_BIND_ADDRESS")
            .help("Bind the webhook server against ADDRESS"),
        Arg::new("port")
            .long("port")
            .value_name("PORT")
            .default_value("9443")
            .env("POD_ADMISSION_WEBHOOK_PORT")
            .help("pod-admission-webhook listen port"),
        Arg::new("metrics-addr")
            .long("metrics-addr")
            .value_name("METRICS_ADDRESS")
            .default_value(":8080")
            .env("POD_ADMISSION_WEBHOOK_METRICS_ADDR")
            .help("The address the metric endpoint binds to. Use \"0\" to disable it"),
        Arg::new("cert-dir")
            .long("cert-dir")
            .value_name("CERT_DIR")
            .env("POD_ADMISSION_WEBHOOK_CERT_DIR")
            .help("Directory that contains the server key and certificate. \
                If not set, the webhook server looks them up in \
                {TempDir}/k8s-webhook-server/serving-certs"),
        Arg::new("cert-name")
            .long("cert-name")
            .value_name("CERT_NAME")
            .default_value("tls.crt")
            .env("POD_ADMISSION_WEBHOOK_CERT_NAME")
            .help("Name of the server certificate file inside of CERT_DIR"),
        Arg::new("key-name")
            .long("key-name")
            .value_name("KEY_NAME")
            .default_value("tls.key")
            .env("POD_ADMISSION_WEBHOOK_KEY_NAME")
            .help("Name of the server key file inside of CERT_DIR"),
    ];
    args.sort_by(|a, b| a.get_id().cmp(b.get_id()));

    Command::new(crate_name!())
        .author(crate_authors!())
        .version(crate_version!())
        .about(crate_description!())
        .args(args)
}
