//! Line-mode interactive shell.
//!
//! ```text
//!            open <n>                 cd ..
//! TopicList ─────────► TopicDetail ──────────► TopicList
//!     │ search <q>          ▲
//!     ▼                     │ open <n>
//!   Search ─────────────────┘
//! ```
//!
//! The topic listing survives while a topic or search is open, so `cd ..`
//! returns to it without a request.

mod command;
mod state;

use command::{BookmarkAction, ShellCommand, HELP};
use state::{BrowseView, TopicListing};

use crate::commands::{self, Context};
use crate::export::ExportFormat;
use crate::output::OutputFormat;
use anyhow::Result;
use forum_client::TopicFilter;
use std::io::{self, BufRead, Write};
use topic_pager::{LoadMoreOutcome, TopicPager};
use tracing::{debug, info};

enum Flow {
    Continue,
    Exit,
}

pub struct Shell<'a> {
    ctx: &'a Context,
    listing: TopicListing,
    view: BrowseView,
}

/// Run the shell until `exit` or end of input.
pub async fn run(ctx: &Context) -> Result<()> {
    let mut shell = Shell::new(ctx);
    shell.run().await
}

fn read_line() -> io::Result<Option<String>> {
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

impl<'a> Shell<'a> {
    pub fn new(ctx: &'a Context) -> Self {
        Self {
            ctx,
            listing: TopicListing::new(TopicFilter::Latest),
            view: BrowseView::TopicList,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        println!(
            "{} - line mode (logged in as @{})",
            self.ctx.client.base_url(),
            self.ctx.client.username()
        );
        println!("Type 'help' for available commands\n");
        info!("Shell started");

        if let Err(e) = self.load_topics().await {
            eprintln!("Error loading topics: {}", e);
        }

        loop {
            print!("ldo> ");
            io::stdout().flush().ok();

            let Some(line) = read_line()? else {
                println!();
                break;
            };

            let command = match ShellCommand::parse(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(message) => {
                    println!("{}", message);
                    continue;
                }
            };

            debug!(command = ?command, "Shell command");
            match self.execute(command).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => break,
                Err(e) => eprintln!("Error: {}", e),
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    async fn execute(&mut self, command: ShellCommand) -> Result<Flow> {
        match command {
            ShellCommand::List(limit) => self.list(limit),
            ShellCommand::Open(position) => self.open(position).await?,
            ShellCommand::Back => {
                self.view = BrowseView::TopicList;
                println!("Back to topic list");
            }
            ShellCommand::Pwd => println!("{}", self.view.location(&self.listing)),
            ShellCommand::View(floor) => self.view_post(floor).await?,
            ShellCommand::More => self.more().await?,
            ShellCommand::Jump(floor) => self.jump(Some(floor)).await?,
            ShellCommand::Last => self.jump(None).await?,
            ShellCommand::Reply => self.reply().await?,
            ShellCommand::Like(floor) => self.like(floor).await?,
            ShellCommand::Browser => {
                let topic_id = self.open_topic()?.topic_id();
                let url = commands::open_topic(self.ctx, topic_id)?;
                println!("Opening in browser: {}", url);
            }
            ShellCommand::Filter(name) => self.filter(name).await?,
            ShellCommand::Refresh => self.refresh().await?,
            ShellCommand::Search(query) => self.search(&query, 1).await?,
            ShellCommand::ClearScreen => {
                print!("\x1B[H\x1B[2J");
                io::stdout().flush().ok();
            }
            ShellCommand::Bookmarks(action) => self.bookmarks(action).await?,
            ShellCommand::Help => println!("{}", HELP),
            ShellCommand::Exit => return Ok(Flow::Exit),
        }
        Ok(Flow::Continue)
    }

    fn open_topic(&self) -> Result<&TopicPager> {
        self.view
            .pager()
            .ok_or_else(|| anyhow::anyhow!("No topic opened. Use 'open <number>' first"))
    }

    fn open_topic_mut(&mut self) -> Result<&mut TopicPager> {
        self.view
            .pager_mut()
            .ok_or_else(|| anyhow::anyhow!("No topic opened. Use 'open <number>' first"))
    }

    async fn load_topics(&mut self) -> Result<()> {
        let page = self.ctx.client.list_topics(self.listing.filter).await?;
        self.listing.reset(page);
        Ok(())
    }

    fn list(&self, limit: usize) {
        match &self.view {
            BrowseView::Search(page) => commands::print_search_page(page),
            _ => commands::print_topics(
                &self.listing.topics,
                &self.listing.filter,
                limit,
                self.listing.more.is_some(),
            ),
        }
    }

    async fn open(&mut self, position: usize) -> Result<()> {
        let topic_id = self
            .view
            .topic_id_at(&self.listing, position)
            .ok_or_else(|| anyhow::anyhow!("Invalid number: {}", position))?;

        let pager = TopicPager::open(&self.ctx.client, topic_id).await?;
        println!("Opened: {}", pager.detail().title);
        println!("Total posts: {}", pager.posts_count());
        self.view = BrowseView::TopicDetail(pager);
        Ok(())
    }

    async fn view_post(&self, floor: Option<u32>) -> Result<()> {
        let pager = self.open_topic()?;
        let post = match floor {
            Some(floor) => pager.view_floor(&self.ctx.client, floor).await?,
            None => match pager.posts().first() {
                Some(post) => post.clone(),
                None => anyhow::bail!("No posts loaded"),
            },
        };
        commands::print_post(&post);
        Ok(())
    }

    async fn more(&mut self) -> Result<()> {
        let search = match &self.view {
            BrowseView::Search(page) => Some((page.query.clone(), page.next_page)),
            _ => None,
        };
        if let Some((query, next)) = search {
            match next {
                Some(next) => self.search(&query, next).await?,
                None => println!("No more results"),
            }
            return Ok(());
        }

        if let Some(pager) = self.view.pager_mut() {
            match pager.load_more(&self.ctx.client).await? {
                LoadMoreOutcome::Loaded { received, .. } => println!(
                    "Loaded {} more posts. Total: {}/{}",
                    received,
                    pager.loaded_count(),
                    pager.posts_count()
                ),
                LoadMoreOutcome::Exhausted => println!("All posts loaded"),
            }
            return Ok(());
        }

        let Some(cursor) = self.listing.more.clone() else {
            println!("No more topics to load");
            return Ok(());
        };
        let page = self.ctx.client.more_topics(&cursor).await?;
        let added = self.listing.append(page);
        println!(
            "Loaded {} more topics. Total: {}",
            added,
            self.listing.topics.len()
        );
        Ok(())
    }

    /// Jump to `floor`, or to the last post when `None`.
    async fn jump(&mut self, floor: Option<u32>) -> Result<()> {
        let Some(pager) = self.view.pager_mut() else {
            anyhow::bail!("No topic opened");
        };
        let outcome = match floor {
            Some(floor) => pager.jump_to_floor(&self.ctx.client, floor).await?,
            None => pager.jump_to_last(&self.ctx.client).await?,
        };

        if let Some(requested) = floor.filter(|f| *f != outcome.floor) {
            println!(
                "Floor #{} is unavailable, showing #{}",
                requested, outcome.floor
            );
        }
        if let Some(post) = pager.posts().get(outcome.target_index) {
            commands::print_post(post);
        }
        println!(
            "{} posts around this floor loaded. Use 'more' to continue.",
            pager.loaded_count()
        );
        Ok(())
    }

    async fn reply(&mut self) -> Result<()> {
        let topic_id = self.open_topic()?.topic_id();

        println!("Enter your reply (type 'END' on a new line to finish, 'CANCEL' to cancel):");
        let message = commands::read_message(&mut io::stdin().lock())?;
        let Some(message) = message else {
            println!("Reply cancelled");
            return Ok(());
        };

        let created = self.ctx.client.create_post(topic_id, &message, None).await?;
        if created.post_number > 0 {
            println!("Reply posted as floor #{}", created.post_number);
        } else {
            println!("Reply posted successfully!");
        }

        let ctx = self.ctx;
        let pager = self.open_topic_mut()?;
        if let Err(e) = pager.refresh(&ctx.client).await {
            eprintln!("Reply posted, but reloading the topic failed: {}", e);
        }
        Ok(())
    }

    async fn like(&mut self, floor: u32) -> Result<()> {
        let ctx = self.ctx;
        let pager = self.open_topic_mut()?;
        let outcome = pager.toggle_like(&ctx.client, floor).await?;

        if outcome.liked {
            println!("Post liked! ({} likes)", outcome.post.like_count());
        } else {
            println!("Post unliked ({} likes)", outcome.post.like_count());
        }
        Ok(())
    }

    async fn filter(&mut self, name: Option<String>) -> Result<()> {
        let Some(name) = name else {
            println!("Current filter: {}", self.listing.filter);
            println!("Available filters: latest, hot, new, top, top:<period>, unread");
            return Ok(());
        };

        let filter: TopicFilter = match name.parse() {
            Ok(TopicFilter::Top(_)) if !name.contains(':') => {
                TopicFilter::Top(self.ctx.client.default_top_period())
            }
            Ok(filter) => filter,
            Err(message) => anyhow::bail!(message),
        };
        self.listing = TopicListing::new(filter);
        self.view = BrowseView::TopicList;
        self.load_topics().await?;
        println!("Switched to {} filter", filter);
        Ok(())
    }

    async fn refresh(&mut self) -> Result<()> {
        let search = match &self.view {
            BrowseView::Search(page) => Some((page.query.clone(), page.page)),
            _ => None,
        };
        if let Some((query, page)) = search {
            return self.search(&query, page).await;
        }

        if let Some(pager) = self.view.pager_mut() {
            pager.refresh(&self.ctx.client).await?;
            println!("Topic refreshed ({} posts)", pager.posts_count());
        } else {
            self.load_topics().await?;
            println!("Topic list refreshed");
        }
        Ok(())
    }

    async fn search(&mut self, query: &str, page: u32) -> Result<()> {
        println!("Searching for '{}' (page {})...", query, page);
        let results = self.ctx.client.search(query, page).await?;
        commands::print_search_page(&results);
        if !results.results.is_empty() {
            println!("Use 'open <n>' to view a topic | 'more' for the next page | 'cd ..' to leave search");
        }
        self.view = BrowseView::Search(results);
        Ok(())
    }

    async fn bookmarks(&self, action: BookmarkAction) -> Result<()> {
        match action {
            BookmarkAction::List => commands::bookmarks_list(self.ctx, &OutputFormat::Text).await,
            BookmarkAction::Export(format) => {
                let format: ExportFormat = match format {
                    Some(name) => name.parse()?,
                    None => ExportFormat::default(),
                };
                let dir = self.ctx.export_dir(None);
                match commands::export_to(self.ctx, format, &dir).await? {
                    Some((path, count)) => {
                        println!("Exported {} bookmarks to: {}", count, path.display())
                    }
                    None => println!("No bookmarks to export."),
                }
                Ok(())
            }
            BookmarkAction::Clear => {
                commands::bookmarks_clear(self.ctx, false, &OutputFormat::Text).await
            }
        }
    }
}
