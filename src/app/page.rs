pub const INDEX_HTML: &str = r#"<!doctype html>
<html>
  <head>
    <meta charset="utf-8">
    <title>ytsum</title>
    <style>
      body { font-family: sans-serif; max-width: 48rem; margin: 2rem auto; padding: 0 1rem; }
      form { display: flex; gap: 0.5rem; }
      input { flex: 1; padding: 0.5rem; }
      .error { color: #b00020; }
      .meta { color: #555; font-size: 0.9rem; }
    </style>
  </head>
  <body>
    <h1>ytsum</h1>
    <form id="form">
      <input id="url" type="url" placeholder="https://www.youtube.com/watch?v=..." required>
      <button id="submit" type="submit">Summarize</button>
    </form>
    <p id="status"></p>
    <section id="result"></section>
    <script>
      const form = document.getElementById("form");
      const button = document.getElementById("submit");
      const status = document.getElementById("status");
      const result = document.getElementById("result");
      let latest = 0;

      function paragraph(text, className) {
        const p = document.createElement("p");
        p.textContent = text;
        if (className) p.className = className;
        return p;
      }

      form.addEventListener("submit", async (event) => {
        event.preventDefault();
        const mine = ++latest;
        button.disabled = true;
        status.className = "";
        status.textContent = "Summarizing...";
        result.replaceChildren();
        try {
          const resp = await fetch("/api/video", {
            method: "POST",
            headers: { "Content-Type": "application/json" },
            body: JSON.stringify({ url: document.getElementById("url").value }),
          });
          const body = await resp.json();
          if (mine !== latest) return;
          if (!resp.ok) {
            status.className = "error";
            status.textContent = body.error || "Something went wrong.";
            return;
          }
          status.textContent = "";
          const title = document.createElement("h2");
          title.textContent = body.video.title;
          result.append(
            title,
            paragraph(`${body.video.channel_title} | ${body.video.duration} | ${body.video.statistics.viewCount} views`, "meta"),
          );
          body.paragraphs.forEach((text) => result.append(paragraph(text)));
          result.append(paragraph(`Summarized by ${body.model} from the ${body.source}`, "meta"));
        } catch (err) {
          if (mine !== latest) return;
          status.className = "error";
          status.textContent = "Network error. Please check your connection and try again.";
        } finally {
          if (mine === latest) button.disabled = false;
        }
      });
    </script>
  </body>
</html>
"#;
