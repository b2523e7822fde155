//! Shell command parsing.

/// Default number of topics `ls` shows.
pub const DEFAULT_LIST_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookmarkAction {
    List,
    Export(Option<String>),
    Clear,
}

/// One parsed shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    List(usize),
    Open(usize),
    Back,
    Pwd,
    View(Option<u32>),
    More,
    Jump(u32),
    Last,
    Reply,
    Like(u32),
    Browser,
    Filter(Option<String>),
    Refresh,
    Search(String),
    ClearScreen,
    Bookmarks(BookmarkAction),
    Help,
    Exit,
}

fn number<T: std::str::FromStr>(arg: Option<&&str>, usage: &str) -> Result<T, String> {
    let arg = arg.ok_or_else(|| format!("Usage: {}", usage))?;
    arg.parse()
        .map_err(|_| format!("Invalid number: {}", arg))
}

impl ShellCommand {
    /// Parse a line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some((cmd, args)) = parts.split_first() else {
            return Ok(None);
        };

        let command = match *cmd {
            "ls" | "list" => ShellCommand::List(match args.first() {
                Some(arg) => match arg.parse::<usize>() {
                    Ok(n) if n > 0 => n,
                    _ => return Err(format!("Invalid number: {}", arg)),
                },
                None => DEFAULT_LIST_LIMIT,
            }),
            "open" => ShellCommand::Open(number(args.first(), "open <number>")?),
            "cd" => match args.first() {
                None | Some(&"..") => ShellCommand::Back,
                Some(_) => ShellCommand::Open(number(args.first(), "cd <number>|..")?),
            },
            "pwd" => ShellCommand::Pwd,
            "cat" | "view" => ShellCommand::View(match args.first() {
                Some(_) => Some(number(args.first(), "view [floor]")?),
                None => None,
            }),
            "more" => ShellCommand::More,
            "jump" => ShellCommand::Jump(number(args.first(), "jump <floor>")?),
            "last" => ShellCommand::Last,
            "reply" => ShellCommand::Reply,
            "like" => ShellCommand::Like(number(args.first(), "like <floor>")?),
            "browser" => ShellCommand::Browser,
            "filter" => ShellCommand::Filter(args.first().map(|s| s.to_string())),
            "refresh" => ShellCommand::Refresh,
            "search" | "find" => {
                if args.is_empty() {
                    return Err("Usage: search <query>".to_string());
                }
                ShellCommand::Search(args.join(" "))
            }
            "clear" => ShellCommand::ClearScreen,
            "bookmarks" | "bm" => ShellCommand::Bookmarks(match args.first() {
                None => BookmarkAction::List,
                Some(&"export") => BookmarkAction::Export(args.get(1).map(|s| s.to_string())),
                Some(&"clear") => BookmarkAction::Clear,
                Some(other) => {
                    return Err(format!(
                        "Unknown bookmarks subcommand: {} (use: bm [export <txt|html|md> | clear])",
                        other
                    ))
                }
            }),
            "help" | "?" => ShellCommand::Help,
            "exit" | "quit" | "q" => ShellCommand::Exit,
            other => {
                return Err(format!(
                    "Unknown command: {}\nType 'help' for available commands",
                    other
                ))
            }
        };
        Ok(Some(command))
    }
}

pub const HELP: &str = "
Available Commands:

Navigation:
  ls [n]          - List topics or search results (first n, default 20)
  open <n>        - Open topic by number
  cd <n>          - Same as open
  cd .. / cd      - Back to the topic list
  pwd             - Show current location

Search:
  search <query>  - Search posts (alias: find)
  more            - Next page of results while searching

Reading:
  cat [floor]     - View a post (alias: view; default: first post)
  more            - Load more topics or posts
  jump <floor>    - Jump to a floor with surrounding context
  last            - Jump to the last post

Interaction:
  reply           - Reply to the open topic
  like <floor>    - Like or unlike a post
  browser         - Open the current topic in a browser

Management:
  filter [name]   - Show or change the filter (latest, hot, new, top, unread)
  refresh         - Reload the current view
  clear           - Clear the screen

Bookmarks:
  bm              - List bookmarks
  bm export [fmt] - Export bookmarks (txt, html, md)
  bm clear        - Delete all bookmarks (asks first)

  help / ?        - Show this help
  exit / quit / q - Exit
";
