//! The single page served at `/`.

pub const INDEX_HTML: &str = r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Img_captions</title>
    <style>
        * {
            margin: 0;
            padding: 0;
            box-sizing: border-box;
        }

        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, Cantarell, sans-serif;
            background: #f4f5fb;
            min-height: 100vh;
            display: flex;
            justify-content: center;
            padding: 40px 20px;
        }

        .container {
            background: white;
            border-radius: 16px;
            box-shadow: 0 10px 40px rgba(0,0,0,0.08);
            max-width: 760px;
            width: 100%;
            padding: 40px;
        }

        h1 {
            color: #333;
            margin-bottom: 24px;
            font-size: 2em;
        }

        .choice {
            display: flex;
            flex-direction: column;
            gap: 8px;
            margin-bottom: 24px;
            color: #444;
        }

        .choice-label {
            font-size: 0.9em;
            color: #666;
        }

        .upload-area {
            border: 3px dashed #667eea;
            border-radius: 12px;
            padding: 48px 20px;
            text-align: center;
            cursor: pointer;
            background: #f8f9ff;
            transition: all 0.2s;
        }

        .upload-area.dragover {
            border-color: #764ba2;
            background: #e8ebff;
        }

        .upload-text {
            color: #667eea;
            font-size: 1.1em;
            font-weight: 600;
            margin-bottom: 8px;
        }

        .upload-hint {
            color: #999;
            font-size: 0.85em;
        }

        input[type="file"] {
            display: none;
        }

        .url-area {
            display: none;
            gap: 10px;
        }

        .url-area input {
            flex: 1;
            padding: 12px;
            border: 2px solid #d8dbf5;
            border-radius: 8px;
            font-size: 1em;
        }

        .url-area button {
            padding: 12px 20px;
            border: none;
            border-radius: 8px;
            background: #667eea;
            color: white;
            font-weight: 600;
            cursor: pointer;
        }

        .loading {
            text-align: center;
            padding: 32px;
            display: none;
            color: #666;
        }

        .spinner {
            border: 4px solid #f3f3f3;
            border-top: 4px solid #667eea;
            border-radius: 50%;
            width: 44px;
            height: 44px;
            animation: spin 1s linear infinite;
            margin: 0 auto 16px;
        }

        @keyframes spin {
            0% { transform: rotate(0deg); }
            100% { transform: rotate(360deg); }
        }

        .error {
            background: #fee;
            border: 2px solid #fcc;
            color: #c33;
            padding: 15px;
            border-radius: 10px;
            margin-top: 20px;
            display: none;
        }

        .preview-container {
            margin-top: 28px;
            display: none;
        }

        .result-container {
            display: none;
        }

        figure img {
            width: 100%;
            border-radius: 10px;
            box-shadow: 0 4px 15px rgba(0,0,0,0.1);
        }

        figcaption {
            text-align: center;
            color: #888;
            font-size: 0.85em;
            margin-top: 8px;
        }

        h2 {
            margin-top: 24px;
            color: #333;
            font-size: 1.3em;
        }

        .caption {
            background: #e9f8ee;
            border: 2px solid #bfe8cc;
            color: #1d6b36;
            border-radius: 10px;
            padding: 16px;
            margin-top: 12px;
            font-size: 1.1em;
            line-height: 1.5;
        }

        .meta-info {
            display: flex;
            justify-content: space-between;
            margin-top: 12px;
            font-size: 0.85em;
            color: #666;
        }
    </style>
</head>
<body>
    <div class="container">
        <h1>🖼️ Img_captions</h1>

        <div class="choice">
            <span class="choice-label">Choose input method:</span>
            <label><input type="radio" name="method" value="upload" checked> Upload an image</label>
            <label><input type="radio" name="method" value="url"> Paste image URL</label>
        </div>

        <div class="upload-area" id="uploadArea">
            <div class="upload-text">Upload an image.</div>
            <div class="upload-hint">Click or drag a PNG or JPEG here</div>
            <input type="file" id="fileInput" accept=".png,.jpg,.jpeg,image/png,image/jpeg">
        </div>

        <form class="url-area" id="urlArea">
            <input type="url" id="urlInput" placeholder="Enter an Image URL.">
            <button type="submit">Caption</button>
        </form>

        <div class="preview-container" id="previewContainer">
            <figure>
                <img id="previewImage" alt="Uploaded Image">
                <figcaption>Uploaded Image</figcaption>
            </figure>
        </div>

        <div class="loading" id="loading">
            <div class="spinner"></div>
            <p>Generating caption...</p>
        </div>

        <div class="error" id="error"></div>

        <div class="result-container" id="resultContainer">
            <h2>📝 Caption:</h2>
            <div class="caption" id="captionText"></div>
            <div class="meta-info">
                <span>Model: <strong id="modelName">--</strong></span>
                <span>Processing: <strong id="processingTime">--</strong> ms</span>
            </div>
        </div>
    </div>

    <script>
        const uploadArea = document.getElementById('uploadArea');
        const fileInput = document.getElementById('fileInput');
        const urlArea = document.getElementById('urlArea');
        const urlInput = document.getElementById('urlInput');
        const loading = document.getElementById('loading');
        const errorDiv = document.getElementById('error');
        const resultContainer = document.getElementById('resultContainer');
        const previewContainer = document.getElementById('previewContainer');
        const previewImage = document.getElementById('previewImage');
        const captionText = document.getElementById('captionText');
        const modelName = document.getElementById('modelName');
        const processingTime = document.getElementById('processingTime');

        document.querySelectorAll('input[name="method"]').forEach((radio) => {
            radio.addEventListener('change', (e) => {
                const upload = e.target.value === 'upload';
                uploadArea.style.display = upload ? 'block' : 'none';
                urlArea.style.display = upload ? 'none' : 'flex';
                errorDiv.style.display = 'none';
            });
        });

        uploadArea.addEventListener('click', () => fileInput.click());

        uploadArea.addEventListener('dragover', (e) => {
            e.preventDefault();
            uploadArea.classList.add('dragover');
        });

        uploadArea.addEventListener('dragleave', () => {
            uploadArea.classList.remove('dragover');
        });

        uploadArea.addEventListener('drop', (e) => {
            e.preventDefault();
            uploadArea.classList.remove('dragover');
            const file = e.dataTransfer.files[0];
            if (file) {
                uploadFile(file);
            }
        });

        fileInput.addEventListener('change', (e) => {
            const file = e.target.files[0];
            if (file) {
                uploadFile(file);
            }
            fileInput.value = '';
        });

        urlArea.addEventListener('submit', (e) => {
            e.preventDefault();
            const url = urlInput.value.trim();
            if (url) {
                showPreview(url);
                submit(fetch('/url', {
                    method: 'POST',
                    headers: { 'Content-Type': 'application/json' },
                    body: JSON.stringify({ url })
                }));
            }
        });

        let previewObjectUrl = null;

        // Shown as soon as an image is chosen, whether or not captioning succeeds.
        function showPreview(src) {
            if (previewObjectUrl) {
                URL.revokeObjectURL(previewObjectUrl);
                previewObjectUrl = null;
            }
            previewImage.src = src;
            previewContainer.style.display = 'block';
        }

        previewImage.addEventListener('error', () => {
            previewContainer.style.display = 'none';
        });

        function uploadFile(file) {
            showPreview(URL.createObjectURL(file));
            previewObjectUrl = previewImage.src;

            const formData = new FormData();
            formData.append('image', file);
            submit(fetch('/upload', { method: 'POST', body: formData }));
        }

        async function submit(request) {
            loading.style.display = 'block';
            resultContainer.style.display = 'none';
            errorDiv.style.display = 'none';

            try {
                const response = await request;
                const result = await response.json().catch(() => ({}));

                if (!response.ok) {
                    throw new Error(result.error || ('Request failed with HTTP ' + response.status));
                }

                showPreview(result.preview);
                captionText.textContent = result.caption;
                modelName.textContent = result.model;
                processingTime.textContent = result.processing_time_ms;
                resultContainer.style.display = 'block';
            } catch (error) {
                errorDiv.textContent = error.message;
                errorDiv.style.display = 'block';
            } finally {
                loading.style.display = 'none';
            }
        }
    </script>
</body>
</html>
"#;
