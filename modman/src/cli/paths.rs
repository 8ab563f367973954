use clap::Args;
use modman_common::config::Config;
use modman_common::error::Result;

#[derive(Args, Debug)]
pub struct Paths {}

impl Paths {
    pub fn run(&self, config: &Config) -> Result<()> {
        println!("Config file: {}", Config::config_file_path().display());
        println!("Cache root:  {}", config.cache_root().display());
        println!("Artifacts:   {}", config.artifacts_dir().display());
        println!("Staging:     {}", config.staging_root().display());
        println!("State:       {}", config.state_dir().display());
        println!("Profiles:    {}", config.profiles_dir().display());
        println!("Logs:        {}", config.logs_dir().display());
        Ok(())
    }
}
