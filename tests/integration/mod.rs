mod config_file;
mod reference_run;
